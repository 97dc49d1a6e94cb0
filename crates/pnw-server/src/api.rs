// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::{
	middleware,
	routing::{delete, get, post},
	Router,
};
use pnw_server_config::RateLimitConfig;
use pnw_server_credentials::{CredentialService, SelfCheck};
use pnw_server_db::{RateLimitRepository, RateLimitStore, SessionRepository, SessionStore};
use sqlx::SqlitePool;

use crate::{auth_middleware::auth_middleware, routes};

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub sessions: Arc<dyn SessionStore>,
	pub rate_limits: Arc<dyn RateLimitStore>,
	pub rate_limit: RateLimitConfig,
	pub credentials: CredentialService,
	/// Cipher self-check outcome from startup, reported by `/health`.
	pub cipher_check: SelfCheck,
}

impl AppState {
	/// Wire repositories onto `pool` and run the cipher self-check.
	pub fn new(
		pool: SqlitePool,
		credentials: CredentialService,
		rate_limit: RateLimitConfig,
	) -> Self {
		let cipher_check = credentials.cipher().self_check();
		Self {
			sessions: Arc::new(SessionRepository::new(pool.clone())),
			rate_limits: Arc::new(RateLimitRepository::new(pool.clone())),
			pool,
			rate_limit,
			credentials,
			cipher_check,
		}
	}
}

pub fn create_router(state: AppState) -> Router {
	let credentials = Router::new()
		.route("/api/credentials/link", post(routes::credentials::link))
		.route("/api/credentials/status", get(routes::credentials::status))
		.route("/api/credentials/unlink", delete(routes::credentials::unlink))
		.route("/api/credentials/validate", post(routes::credentials::validate))
		.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

	Router::new()
		.route("/health", get(routes::health::health_check))
		.merge(credentials)
		.with_state(state)
}
