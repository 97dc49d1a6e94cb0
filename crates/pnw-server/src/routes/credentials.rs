// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential HTTP handlers.
//!
//! These endpoints never return a plaintext key; the only representation
//! that leaves the server is the masked view.

use std::collections::BTreeSet;

use axum::{
	extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
	Json,
};
use pnw_common_secret::SecretString;
use pnw_server_auth::OwnerKind;
use pnw_server_credentials::{mask, CredentialStatus, DEFAULT_VISIBLE_CHARS};
use pnw_server_game_api::{AllianceIdentity, NationIdentity, UsageSnapshot, ValidationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{api::AppState, auth_middleware::RequireCaller, error::ServerError, rate_limit};

fn default_owner_kind() -> OwnerKind {
	OwnerKind::User
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
	pub secret: SecretString,
	#[serde(default = "default_owner_kind")]
	pub owner_kind: OwnerKind,
	#[serde(default)]
	pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
	pub secret: SecretString,
}

/// Query string for status and unlink. `owner_id` defaults to the caller
/// when `owner_kind` is `user`.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
	#[serde(default = "default_owner_kind")]
	pub owner_kind: OwnerKind,
	#[serde(default)]
	pub owner_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
	pub identity: NationIdentity,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub alliance: Option<AllianceIdentity>,
	pub capabilities: BTreeSet<String>,
	pub usage: UsageSnapshot,
	pub masked_view: String,
	/// Only set by link.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub relinked: Option<bool>,
}

impl ValidationResponse {
	fn new(result: ValidationResult, masked_view: String, relinked: Option<bool>) -> Self {
		Self {
			identity: result.nation,
			alliance: result.alliance,
			capabilities: result.capabilities,
			usage: result.usage,
			masked_view,
			relinked,
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnlinkResponse {
	pub unlinked: bool,
	pub was_linked: bool,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
	body.map(|Json(value)| value)
		.map_err(|e| ServerError::BadRequest(e.body_text()))
}

fn owner_query(query: Result<Query<OwnerQuery>, QueryRejection>) -> Result<OwnerQuery, ServerError> {
	query
		.map(|Query(value)| value)
		.map_err(|e| ServerError::BadRequest(e.body_text()))
}

/// POST /api/credentials/link
#[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn link(
	State(state): State<AppState>,
	RequireCaller(caller): RequireCaller,
	body: Result<Json<LinkRequest>, JsonRejection>,
) -> Result<Json<ValidationResponse>, ServerError> {
	let request = json_body(body)?;
	rate_limit::enforce(&state, &caller, "link").await?;

	let outcome = state
		.credentials
		.link(&caller, request.owner_kind, request.owner_id, &request.secret)
		.await?;

	Ok(Json(ValidationResponse::new(
		outcome.result,
		outcome.masked_view,
		Some(outcome.relinked),
	)))
}

/// GET /api/credentials/status
#[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn status(
	State(state): State<AppState>,
	RequireCaller(caller): RequireCaller,
	query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<CredentialStatus>, ServerError> {
	let query = owner_query(query)?;
	let status = state
		.credentials
		.status(&caller, query.owner_kind, query.owner_id)
		.await?;
	Ok(Json(status))
}

/// DELETE /api/credentials/unlink
#[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn unlink(
	State(state): State<AppState>,
	RequireCaller(caller): RequireCaller,
	query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<UnlinkResponse>, ServerError> {
	let query = owner_query(query)?;
	let was_linked = state
		.credentials
		.unlink(&caller, query.owner_kind, query.owner_id)
		.await?;
	Ok(Json(UnlinkResponse {
		unlinked: true,
		was_linked,
	}))
}

/// POST /api/credentials/validate
#[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn validate(
	State(state): State<AppState>,
	RequireCaller(caller): RequireCaller,
	body: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidationResponse>, ServerError> {
	let request = json_body(body)?;
	rate_limit::enforce(&state, &caller, "validate").await?;

	let result = state.credentials.validate(&caller, &request.secret).await?;
	let masked_view = mask(request.secret.expose(), DEFAULT_VISIBLE_CHARS);
	Ok(Json(ValidationResponse::new(result, masked_view, None)))
}
