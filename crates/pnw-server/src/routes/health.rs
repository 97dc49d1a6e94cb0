// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use pnw_server_credentials::SelfCheck;
use serde::{Deserialize, Serialize};

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub timestamp: String,
	/// `ok` or `error`.
	pub database: String,
	/// `ok`, `unconfigured` or `failed`.
	pub cipher: String,
}

/// GET /health
///
/// 503 when the database is unreachable. A cipher that is unconfigured or
/// failed its startup self-check degrades the status but still answers 200.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let database_ok = match pnw_server_db::ping(&state.pool).await {
		Ok(()) => true,
		Err(e) => {
			tracing::error!(error = %e, "health check: database unreachable");
			false
		}
	};

	let status = match (database_ok, &state.cipher_check) {
		(false, _) => HealthStatus::Unhealthy,
		(true, SelfCheck::Passed) => HealthStatus::Healthy,
		(true, _) => HealthStatus::Degraded,
	};

	let response = HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		database: if database_ok { "ok" } else { "error" }.to_string(),
		cipher: state.cipher_check.as_str().to_string(),
	};

	let http_status = match status {
		HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	(http_status, Json(response))
}
