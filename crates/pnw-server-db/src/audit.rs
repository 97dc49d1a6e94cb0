// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read access to the `audit_logs` table.
//!
//! Rows are written by the audit pipeline's SQLite sink; this repository only
//! queries them.

use serde::Serialize;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogRow {
	pub id: String,
	pub timestamp: String,
	pub event_type: String,
	pub severity: String,
	pub actor_user_id: Option<String>,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
	pub action: String,
	pub details: serde_json::Value,
}

#[derive(Clone)]
pub struct AuditLogRepository {
	pool: SqlitePool,
}

impl AuditLogRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Entries for one credential owner, newest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_for_resource(
		&self,
		resource_type: &str,
		resource_id: &str,
		limit: i64,
	) -> Result<Vec<AuditLogRow>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, timestamp, event_type, severity, actor_user_id,
			       resource_type, resource_id, action, details
			FROM audit_logs
			WHERE resource_type = ? AND resource_id = ?
			ORDER BY timestamp DESC
			LIMIT ?
			"#,
		)
		.bind(resource_type)
		.bind(resource_id)
		.bind(limit)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_audit_row).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_by_event_type(&self, event_type: &str) -> Result<i64, DbError> {
		let row = sqlx::query("SELECT COUNT(*) AS n FROM audit_logs WHERE event_type = ?")
			.bind(event_type)
			.fetch_one(&self.pool)
			.await?;
		Ok(row.get("n"))
	}
}

fn parse_audit_row(row: &sqlx::sqlite::SqliteRow) -> Result<AuditLogRow, DbError> {
	let details: String = row.get("details");
	Ok(AuditLogRow {
		id: row.get("id"),
		timestamp: row.get("timestamp"),
		event_type: row.get("event_type"),
		severity: row.get("severity"),
		actor_user_id: row.get("actor_user_id"),
		resource_type: row.get("resource_type"),
		resource_id: row.get("resource_id"),
		action: row.get("action"),
		details: serde_json::from_str(&details)?,
	})
}
