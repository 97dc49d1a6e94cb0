// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::{header::RETRY_AFTER, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use pnw_server_credentials::CredentialError;
use pnw_server_db::DbError;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error(transparent)]
	Credential(#[from] CredentialError),

	/// Malformed body or query string.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Authentication required")]
	Unauthorized,

	/// Per-caller request budget exhausted.
	#[error("Too many requests, retry in {retry_after_secs}s")]
	RateLimited { retry_after_secs: u64 },
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
		}
	}
}

/// Status code for each credential error kind.
pub fn credential_status(err: &CredentialError) -> StatusCode {
	match err {
		CredentialError::InvalidFormat { .. }
		| CredentialError::InvalidOrExpired
		| CredentialError::MissingOwnerId => StatusCode::BAD_REQUEST,
		CredentialError::AccessDenied(_) => StatusCode::FORBIDDEN,
		CredentialError::OwnerNotFound => StatusCode::NOT_FOUND,
		CredentialError::AlreadyLinkedElsewhere => StatusCode::CONFLICT,
		CredentialError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
		CredentialError::UnknownUpstreamError(_) | CredentialError::UsageCheckFailed(_) => {
			StatusCode::BAD_GATEWAY
		}
		CredentialError::UpstreamUnavailable(_)
		| CredentialError::EncryptionUnavailable(_)
		| CredentialError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
		CredentialError::DecryptionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

fn credential_response(err: &CredentialError) -> (StatusCode, ErrorResponse) {
	let status = credential_status(err);
	let message = match err {
		CredentialError::StoreUnavailable(detail) => {
			tracing::error!(error = %detail, "credential store unavailable");
			"Credential store unavailable".to_string()
		}
		CredentialError::DecryptionError(e) => {
			tracing::error!(error = %e, "stored credential could not be decrypted");
			"Stored credential could not be decrypted".to_string()
		}
		other => {
			if status.is_server_error() {
				tracing::warn!(error = %other, kind = other.kind(), "credential operation failed");
			}
			other.to_string()
		}
	};
	(status, ErrorResponse::new(err.kind(), message))
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::SERVICE_UNAVAILABLE,
					ErrorResponse::new("store_unavailable", "A database error occurred"),
				)
			}
			ServerError::Credential(e) => credential_response(e),
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("bad_request", msg.clone()),
			),
			ServerError::Unauthorized => (
				StatusCode::UNAUTHORIZED,
				ErrorResponse::new("unauthorized", "Authentication required"),
			),
			ServerError::RateLimited { .. } => (
				StatusCode::TOO_MANY_REQUESTS,
				ErrorResponse::new("rate_limited", self.to_string()),
			),
		};

		let mut response = (status, Json(body)).into_response();
		if let ServerError::RateLimited { retry_after_secs } = self {
			if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
				response.headers_mut().insert(RETRY_AFTER, value);
			}
		}
		response
	}
}
