// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_users_and_sessions",
		include_str!("../migrations/001_users_and_sessions.sql"),
	),
	(
		"002_alliance_managers",
		include_str!("../migrations/002_alliance_managers.sql"),
	),
	(
		"003_rate_limits",
		include_str!("../migrations/003_rate_limits.sql"),
	),
	(
		"004_audit_logs",
		include_str!("../migrations/004_audit_logs.sql"),
	),
];

/// Run all database migrations.
///
/// Every statement is `IF NOT EXISTS`, so running twice is a no-op.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}
	Ok(())
}
