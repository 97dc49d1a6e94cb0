// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pnw_server_auth::{AllianceId, ManagerId, NationId, OwnerKind};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use super::{CredentialStore, StoredCredential};
use crate::error::StoreError;

/// Credential columns on `users` and `alliance_managers`.
#[derive(Clone)]
pub struct SqliteCredentialStore {
	pool: SqlitePool,
}

impl SqliteCredentialStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

fn table_for(kind: OwnerKind) -> &'static str {
	match kind {
		OwnerKind::User => "users",
		OwnerKind::AllianceManager => "alliance_managers",
	}
}

fn other_table(kind: OwnerKind) -> &'static str {
	match kind {
		OwnerKind::User => table_for(OwnerKind::AllianceManager),
		OwnerKind::AllianceManager => table_for(OwnerKind::User),
	}
}

fn map_write_error(e: sqlx::Error) -> StoreError {
	match &e {
		sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::FingerprintConflict,
		_ => StoreError::Sqlx(e),
	}
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| StoreError::Corrupt(format!("invalid pnw_api_key_linked_at: {e}")))
}

fn parse_row(row: &sqlx::sqlite::SqliteRow) -> Result<Option<StoredCredential>, StoreError> {
	let Some(ciphertext) = row.get::<Option<String>, _>("pnw_api_key") else {
		return Ok(None);
	};

	let nation_id = row
		.get::<Option<i64>, _>("pnw_nation_id")
		.ok_or_else(|| StoreError::Corrupt("credential without pnw_nation_id".to_string()))?;
	let linked_at = row
		.get::<Option<String>, _>("pnw_api_key_linked_at")
		.ok_or_else(|| StoreError::Corrupt("credential without pnw_api_key_linked_at".to_string()))?;

	Ok(Some(StoredCredential {
		ciphertext,
		fingerprint: row
			.get::<Option<String>, _>("pnw_api_key_fingerprint")
			.unwrap_or_default(),
		nation_id: NationId::new(nation_id),
		nation_name: row
			.get::<Option<String>, _>("pnw_nation_name")
			.unwrap_or_default(),
		alliance_id: row
			.get::<Option<i64>, _>("pnw_alliance_id")
			.map(AllianceId::new),
		alliance_name: row.get("pnw_alliance_name"),
		linked_at: parse_timestamp(&linked_at)?,
	}))
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
	#[tracing::instrument(skip(self), fields(owner_kind = %kind, owner_id = %owner_id))]
	async fn get(
		&self,
		kind: OwnerKind,
		owner_id: Uuid,
	) -> Result<Option<StoredCredential>, StoreError> {
		let sql = format!(
			r#"
			SELECT pnw_api_key, pnw_api_key_fingerprint, pnw_nation_id, pnw_nation_name,
			       pnw_alliance_id, pnw_alliance_name, pnw_api_key_linked_at
			FROM {}
			WHERE id = ?
			"#,
			table_for(kind)
		);

		let row = sqlx::query(&sql)
			.bind(owner_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => parse_row(&row),
			None => Ok(None),
		}
	}

	#[tracing::instrument(skip(self, credential), fields(owner_kind = %kind, owner_id = %owner_id))]
	async fn put(
		&self,
		kind: OwnerKind,
		owner_id: Uuid,
		credential: &StoredCredential,
	) -> Result<(), StoreError> {
		// Fingerprints are unique across both owner tables; a single UPDATE keeps
		// the check and the write atomic under SQLite's writer lock.
		let sql = format!(
			r#"
			UPDATE {table}
			SET pnw_api_key = ?,
			    pnw_api_key_fingerprint = ?,
			    pnw_nation_id = ?,
			    pnw_nation_name = ?,
			    pnw_alliance_id = ?,
			    pnw_alliance_name = ?,
			    pnw_api_key_linked_at = ?,
			    updated_at = ?
			WHERE id = ?
			  AND NOT EXISTS (
			      SELECT 1 FROM {table}
			      WHERE pnw_api_key_fingerprint = ? AND pnw_api_key IS NOT NULL AND id <> ?
			  )
			  AND NOT EXISTS (
			      SELECT 1 FROM {other}
			      WHERE pnw_api_key_fingerprint = ? AND pnw_api_key IS NOT NULL
			  )
			"#,
			table = table_for(kind),
			other = other_table(kind),
		);

		let result = sqlx::query(&sql)
			.bind(&credential.ciphertext)
			.bind(&credential.fingerprint)
			.bind(credential.nation_id.get())
			.bind(&credential.nation_name)
			.bind(credential.alliance_id.map(AllianceId::get))
			.bind(&credential.alliance_name)
			.bind(credential.linked_at.to_rfc3339())
			.bind(Utc::now().to_rfc3339())
			.bind(owner_id.to_string())
			.bind(&credential.fingerprint)
			.bind(owner_id.to_string())
			.bind(&credential.fingerprint)
			.execute(&self.pool)
			.await
			.map_err(map_write_error)?;

		if result.rows_affected() == 0 {
			let exists = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = ?", table_for(kind)))
				.bind(owner_id.to_string())
				.fetch_optional(&self.pool)
				.await?
				.is_some();
			return Err(if exists {
				StoreError::FingerprintConflict
			} else {
				StoreError::OwnerNotFound
			});
		}

		tracing::debug!("credential stored");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(owner_kind = %kind, owner_id = %owner_id))]
	async fn remove(&self, kind: OwnerKind, owner_id: Uuid) -> Result<bool, StoreError> {
		let sql = format!(
			r#"
			UPDATE {}
			SET pnw_api_key = NULL,
			    pnw_api_key_fingerprint = NULL,
			    pnw_nation_id = NULL,
			    pnw_nation_name = NULL,
			    pnw_alliance_id = NULL,
			    pnw_alliance_name = NULL,
			    pnw_api_key_linked_at = NULL,
			    updated_at = ?
			WHERE id = ? AND pnw_api_key IS NOT NULL
			"#,
			table_for(kind)
		);

		let result = sqlx::query(&sql)
			.bind(Utc::now().to_rfc3339())
			.bind(owner_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self, fingerprint))]
	async fn find_by_fingerprint(
		&self,
		fingerprint: &str,
	) -> Result<Option<(OwnerKind, Uuid)>, StoreError> {
		let row = sqlx::query(
			r#"
			SELECT 'user' AS kind, id FROM users
			WHERE pnw_api_key_fingerprint = ? AND pnw_api_key IS NOT NULL
			UNION ALL
			SELECT 'alliance_manager' AS kind, id FROM alliance_managers
			WHERE pnw_api_key_fingerprint = ? AND pnw_api_key IS NOT NULL
			LIMIT 1
			"#,
		)
		.bind(fingerprint)
		.bind(fingerprint)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|row| {
			let kind = match row.get::<String, _>("kind").as_str() {
				"alliance_manager" => OwnerKind::AllianceManager,
				_ => OwnerKind::User,
			};
			let id: String = row.get("id");
			Uuid::parse_str(&id)
				.map(|id| (kind, id))
				.map_err(|e| StoreError::Corrupt(format!("invalid owner id: {e}")))
		})
		.transpose()
	}

	#[tracing::instrument(skip(self), fields(manager_id = %manager_id))]
	async fn manager_alliance(
		&self,
		manager_id: ManagerId,
	) -> Result<Option<AllianceId>, StoreError> {
		let row = sqlx::query("SELECT alliance_id FROM alliance_managers WHERE id = ?")
			.bind(manager_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(|row| AllianceId::new(row.get::<i64, _>("alliance_id"))))
	}
}
