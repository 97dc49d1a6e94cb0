// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::Utc;
use pnw_server_auth::Caller;

use crate::{api::AppState, error::ServerError};

/// Count one request by `caller` against `route` and reject when the sliding
/// estimate exceeds the configured budget.
#[tracing::instrument(skip(state, caller), fields(user_id = %caller.user_id))]
pub async fn enforce(state: &AppState, caller: &Caller, route: &str) -> Result<(), ServerError> {
	let config = &state.rate_limit;
	if !config.enabled {
		return Ok(());
	}

	let key = format!("{route}:{}", caller.user_id);
	let hit = state
		.rate_limits
		.hit(&key, Utc::now(), config.window_secs)
		.await?;

	if hit.exceeds(config.max_requests) {
		tracing::info!(
			estimate = hit.estimate,
			max = config.max_requests,
			"rate limit exceeded"
		);
		return Err(ServerError::RateLimited {
			retry_after_secs: hit.reset_after_secs.max(1),
		});
	}
	Ok(())
}
