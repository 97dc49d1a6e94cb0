// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Seeding helpers for tests. Enabled by the `testing` feature.

use chrono::{DateTime, Utc};
use pnw_server_auth::{AllianceId, ManagerId, ManagerRole, UserId};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::migrations::run_migrations;
use crate::pool::create_pool;

/// A migrated in-memory database.
pub async fn test_pool() -> Result<SqlitePool, DbError> {
	let pool = create_pool("sqlite::memory:").await?;
	run_migrations(&pool).await?;
	Ok(pool)
}

pub async fn seed_user(
	pool: &SqlitePool,
	username: &str,
	is_system_admin: bool,
) -> Result<UserId, DbError> {
	let id = UserId::generate();
	let now = Utc::now().to_rfc3339();
	sqlx::query(
		r#"
		INSERT INTO users (id, discord_id, username, is_system_admin, created_at, updated_at)
		VALUES (?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(id.to_string())
	.bind(Uuid::new_v4().to_string())
	.bind(username)
	.bind(is_system_admin)
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await?;
	Ok(id)
}

pub async fn seed_session(
	pool: &SqlitePool,
	user_id: &UserId,
	token_hash: &str,
	expires_at: DateTime<Utc>,
) -> Result<(), DbError> {
	sqlx::query(
		r#"
		INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
		VALUES (?, ?, ?, ?, ?)
		"#,
	)
	.bind(Uuid::new_v4().to_string())
	.bind(user_id.to_string())
	.bind(token_hash)
	.bind(Utc::now().to_rfc3339())
	.bind(expires_at.to_rfc3339())
	.execute(pool)
	.await?;
	Ok(())
}

pub async fn seed_manager(
	pool: &SqlitePool,
	user_id: &UserId,
	alliance_id: AllianceId,
	role: ManagerRole,
	is_active: bool,
) -> Result<ManagerId, DbError> {
	let id = ManagerId::generate();
	let now = Utc::now().to_rfc3339();
	sqlx::query(
		r#"
		INSERT INTO alliance_managers (id, user_id, alliance_id, role, is_active, created_at, updated_at)
		VALUES (?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(id.to_string())
	.bind(user_id.to_string())
	.bind(alliance_id.get())
	.bind(role.to_string())
	.bind(is_active)
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await?;
	Ok(id)
}
