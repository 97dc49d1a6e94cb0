// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolving a bearer session token into a [`Caller`].
//!
//! Sessions are issued elsewhere; this repository only reads `sessions`,
//! `users` and `alliance_managers`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pnw_server_auth::{
	AllianceId, Caller, GlobalRole, ManagerGrant, ManagerId, ManagerRole, UserId,
};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Look up an unexpired session by token hash and load the caller's
	/// roles and active manager grants.
	async fn resolve_caller(
		&self,
		token_hash: &str,
		now: DateTime<Utc>,
	) -> Result<Option<Caller>, DbError>;
}

#[async_trait]
impl SessionStore for SessionRepository {
	async fn resolve_caller(
		&self,
		token_hash: &str,
		now: DateTime<Utc>,
	) -> Result<Option<Caller>, DbError> {
		self.resolve_caller(token_hash, now).await
	}
}

#[derive(Clone)]
pub struct SessionRepository {
	pool: SqlitePool,
}

impl SessionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, token_hash))]
	pub async fn resolve_caller(
		&self,
		token_hash: &str,
		now: DateTime<Utc>,
	) -> Result<Option<Caller>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT s.expires_at, u.id AS user_id, u.is_system_admin
			FROM sessions s
			JOIN users u ON u.id = s.user_id
			WHERE s.token_hash = ?
			"#,
		)
		.bind(token_hash)
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};

		let expires_at = parse_timestamp(&row.get::<String, _>("expires_at"), "expires_at")?;
		if expires_at <= now {
			tracing::debug!("session expired");
			return Ok(None);
		}

		let user_id = parse_uuid(&row.get::<String, _>("user_id"), "user_id")?;
		let mut caller = Caller::new(UserId::new(user_id));
		if row.get::<bool, _>("is_system_admin") {
			caller = caller.with_global_role(GlobalRole::SystemAdmin);
		}

		caller.manager_grants = self.grants_for_user(&caller.user_id).await?;
		tracing::debug!(
			user_id = %caller.user_id,
			grants = caller.manager_grants.len(),
			"caller resolved"
		);
		Ok(Some(caller))
	}

	/// Active manager grants held by `user_id`.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn grants_for_user(&self, user_id: &UserId) -> Result<Vec<ManagerGrant>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, alliance_id, role, is_active
			FROM alliance_managers
			WHERE user_id = ? AND is_active = 1
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_grant_row).collect()
	}
}

fn parse_grant_row(row: &sqlx::sqlite::SqliteRow) -> Result<ManagerGrant, DbError> {
	let id: String = row.get("id");
	let role: String = row.get("role");
	Ok(ManagerGrant {
		manager_id: ManagerId::new(parse_uuid(&id, "alliance_managers.id")?),
		alliance_id: AllianceId::new(row.get::<i64, _>("alliance_id")),
		role: role
			.parse::<ManagerRole>()
			.map_err(DbError::Internal)?,
		is_active: row.get::<bool, _>("is_active"),
	})
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid, DbError> {
	Uuid::parse_str(value).map_err(|e| DbError::Internal(format!("Invalid {column} UUID: {e}")))
}

pub(crate) fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{seed_manager, seed_session, seed_user, test_pool};
	use chrono::Duration;

	#[tokio::test]
	async fn unknown_token_resolves_to_none() {
		let pool = test_pool().await.unwrap();
		let repo = SessionRepository::new(pool);
		assert!(repo.resolve_caller("nope", Utc::now()).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn resolves_plain_user() {
		let pool = test_pool().await.unwrap();
		let user = seed_user(&pool, "alice", false).await.unwrap();
		seed_session(&pool, &user, "hash-a", Utc::now() + Duration::hours(1))
			.await
			.unwrap();

		let caller = SessionRepository::new(pool)
			.resolve_caller("hash-a", Utc::now())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(caller.user_id, user);
		assert!(!caller.is_system_admin());
		assert!(caller.manager_grants.is_empty());
	}

	#[tokio::test]
	async fn resolves_admin_and_active_grants_only() {
		let pool = test_pool().await.unwrap();
		let user = seed_user(&pool, "bob", true).await.unwrap();
		seed_session(&pool, &user, "hash-b", Utc::now() + Duration::hours(1))
			.await
			.unwrap();
		seed_manager(&pool, &user, AllianceId::new(10), ManagerRole::Admin, true)
			.await
			.unwrap();
		seed_manager(&pool, &user, AllianceId::new(11), ManagerRole::Viewer, false)
			.await
			.unwrap();

		let caller = SessionRepository::new(pool)
			.resolve_caller("hash-b", Utc::now())
			.await
			.unwrap()
			.unwrap();
		assert!(caller.is_system_admin());
		assert_eq!(caller.manager_grants.len(), 1);
		assert_eq!(
			caller.manager_role_for(AllianceId::new(10)),
			Some(ManagerRole::Admin)
		);
	}

	#[tokio::test]
	async fn expired_session_resolves_to_none() {
		let pool = test_pool().await.unwrap();
		let user = seed_user(&pool, "carol", false).await.unwrap();
		seed_session(&pool, &user, "hash-c", Utc::now() - Duration::minutes(1))
			.await
			.unwrap();

		let repo = SessionRepository::new(pool);
		assert!(repo.resolve_caller("hash-c", Utc::now()).await.unwrap().is_none());
	}
}
