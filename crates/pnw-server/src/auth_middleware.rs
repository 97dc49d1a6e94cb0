// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer-session authentication.
//!
//! [`auth_middleware`] resolves the `Authorization: Bearer` token into a
//! [`Caller`] and stores it as a request extension. Handlers take
//! [`RequireCaller`], which rejects with 401 when no caller was resolved.

use axum::{
	body::Body,
	extract::{FromRequestParts, State},
	http::{request::Parts, Request},
	middleware::Next,
	response::{IntoResponse, Response},
};
use chrono::Utc;
use pnw_server_auth::{extract_bearer_token, hash_token, Caller};
use tracing::instrument;

use crate::{api::AppState, error::ServerError};

#[instrument(name = "auth_middleware", skip_all)]
pub async fn auth_middleware(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	if let Some(token) = extract_bearer_token(request.headers()) {
		match state
			.sessions
			.resolve_caller(&hash_token(&token), Utc::now())
			.await
		{
			Ok(Some(caller)) => {
				tracing::debug!(user_id = %caller.user_id, "session resolved");
				request.extensions_mut().insert(caller);
			}
			Ok(None) => tracing::debug!("bearer token did not match a live session"),
			Err(e) => return ServerError::from(e).into_response(),
		}
	}

	next.run(request).await
}

/// Extractor for the authenticated caller.
pub struct RequireCaller(pub Caller);

impl<S> FromRequestParts<S> for RequireCaller
where
	S: Send + Sync,
{
	type Rejection = ServerError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<Caller>()
			.cloned()
			.map(RequireCaller)
			.ok_or(ServerError::Unauthorized)
	}
}
