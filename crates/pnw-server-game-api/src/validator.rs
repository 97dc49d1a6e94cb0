// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key validation and usage checks against the game GraphQL API.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use pnw_common_secret::SecretString;
use pnw_server_auth::{AllianceId, NationId};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{GameApiError, TransportError};
use crate::transport::{GameApiTransport, TransportResponse};
use crate::types::{AllianceIdentity, NationIdentity, UsageSnapshot, ValidationResult};

/// Keys shorter than this are rejected without a network call.
pub const MIN_KEY_LENGTH: usize = 20;

pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USAGE_TIMEOUT: Duration = Duration::from_secs(5);

const VALIDATION_QUERY: &str = "{ me { requests max_requests permissions { \
	nation_view nation_view_resources nation_deposit_to_bank nation_military_buys \
	nation_see_reset_timers nation_see_spies nation_view_trades nation_accept_trade \
	nation_send_message alliance_view_bank alliance_withdraw_bank \
	alliance_change_permissions alliance_see_spies alliance_see_reset_timers \
	alliance_tax_brackets alliance_accept_applicants alliance_remove_members \
	alliance_manage_treaties alliance_promote_self_to_leader } \
	nation { id nation_name alliance { id name } } } }";

const USAGE_QUERY: &str = "{ me { requests max_requests } }";

#[async_trait]
pub trait KeyValidator: Send + Sync {
	/// Confirm the key is live and collect its identity, permissions and usage.
	async fn validate(&self, api_key: &SecretString) -> Result<ValidationResult, GameApiError>;

	/// Fetch request counters only. Every failure is `UsageCheckFailed`.
	async fn check_usage(&self, api_key: &SecretString) -> Result<UsageSnapshot, GameApiError>;
}

pub struct GameApiValidator<T> {
	transport: T,
	validation_timeout: Duration,
	usage_timeout: Duration,
}

impl<T: GameApiTransport> GameApiValidator<T> {
	pub fn new(transport: T) -> Self {
		Self {
			transport,
			validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
			usage_timeout: DEFAULT_USAGE_TIMEOUT,
		}
	}

	pub fn with_timeouts(mut self, validation: Duration, usage: Duration) -> Self {
		self.validation_timeout = validation;
		self.usage_timeout = usage;
		self
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}
}

#[async_trait]
impl<T: GameApiTransport> KeyValidator for GameApiValidator<T> {
	#[instrument(skip(self, api_key))]
	async fn validate(&self, api_key: &SecretString) -> Result<ValidationResult, GameApiError> {
		let len = api_key.char_len();
		if len < MIN_KEY_LENGTH {
			debug!(len, "API key rejected locally");
			return Err(GameApiError::InvalidFormat {
				min: MIN_KEY_LENGTH,
			});
		}

		let response = self
			.transport
			.query(api_key, VALIDATION_QUERY, self.validation_timeout)
			.await
			.map_err(transport_failure)?;

		let me = parse_me(&response, api_key)?;
		let result = me.into_validation_result()?;
		debug!(
			nation_id = %result.nation.id,
			capabilities = result.capabilities.len(),
			"API key validated"
		);
		Ok(result)
	}

	#[instrument(skip(self, api_key))]
	async fn check_usage(&self, api_key: &SecretString) -> Result<UsageSnapshot, GameApiError> {
		let result = async {
			let response = self
				.transport
				.query(api_key, USAGE_QUERY, self.usage_timeout)
				.await
				.map_err(transport_failure)?;
			let me = parse_me(&response, api_key)?;
			Ok::<_, GameApiError>(UsageSnapshot::new(me.requests, me.max_requests))
		}
		.await;

		result.map_err(|e| {
			warn!(error = %e, "usage check failed");
			GameApiError::UsageCheckFailed(e.to_string())
		})
	}
}

fn transport_failure(e: TransportError) -> GameApiError {
	GameApiError::UpstreamUnavailable(e.to_string())
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
	data: Option<GraphQlData>,
	#[serde(default)]
	errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
	me: Option<Me>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
	message: String,
}

#[derive(Debug, Deserialize)]
struct Me {
	#[serde(default)]
	requests: u64,
	#[serde(default)]
	max_requests: u64,
	#[serde(default)]
	permissions: Option<serde_json::Map<String, serde_json::Value>>,
	#[serde(default)]
	nation: Option<MeNation>,
}

#[derive(Debug, Deserialize)]
struct MeNation {
	#[serde(deserialize_with = "de_game_id")]
	id: i64,
	nation_name: String,
	#[serde(default)]
	alliance: Option<MeAlliance>,
}

#[derive(Debug, Deserialize)]
struct MeAlliance {
	#[serde(deserialize_with = "de_game_id")]
	id: i64,
	name: String,
}

impl Me {
	fn into_validation_result(self) -> Result<ValidationResult, GameApiError> {
		let nation = self.nation.ok_or_else(|| {
			GameApiError::UnknownUpstreamError("response did not include a nation".to_string())
		})?;

		let capabilities: BTreeSet<String> = self
			.permissions
			.unwrap_or_default()
			.into_iter()
			.filter(|(_, granted)| granted.as_bool() == Some(true))
			.map(|(name, _)| name)
			.collect();

		Ok(ValidationResult {
			nation: NationIdentity {
				id: NationId::new(nation.id),
				name: nation.nation_name,
			},
			alliance: nation.alliance.map(|a| AllianceIdentity {
				id: AllianceId::new(a.id),
				name: a.name,
			}),
			capabilities,
			usage: UsageSnapshot::new(self.requests, self.max_requests),
		})
	}
}

/// GraphQL `ID` fields arrive as strings; accept plain numbers too.
fn de_game_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawId {
		Num(i64),
		Str(String),
	}

	match RawId::deserialize(deserializer)? {
		RawId::Num(n) => Ok(n),
		RawId::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
	}
}

/// Turn a raw response into `me`, or a classified error.
fn parse_me(response: &TransportResponse, api_key: &SecretString) -> Result<Me, GameApiError> {
	let envelope = serde_json::from_str::<GraphQlEnvelope>(&response.body).ok();

	let messages = match &envelope {
		Some(env) if !env.errors.is_empty() => env
			.errors
			.iter()
			.map(|e| e.message.as_str())
			.collect::<Vec<_>>()
			.join("; "),
		Some(_) => String::new(),
		None => response.body.clone(),
	};

	let is_success = (200..300).contains(&response.status);
	if is_success && messages.is_empty() {
		if let Some(me) = envelope.and_then(|env| env.data).and_then(|data| data.me) {
			return Ok(me);
		}
		return Err(GameApiError::UnknownUpstreamError(
			"response did not include `me`".to_string(),
		));
	}

	Err(classify(response.status, &redact(&messages, api_key)))
}

/// Upstream error phrases first, then the status code.
fn classify(status: u16, message: &str) -> GameApiError {
	if message.contains("Invalid API key") || message.contains("Unauthorized") {
		return GameApiError::InvalidOrExpired;
	}
	if message.contains("Rate limit exceeded") {
		return GameApiError::UpstreamRateLimited;
	}

	match status {
		401 | 403 => GameApiError::InvalidOrExpired,
		429 => GameApiError::UpstreamRateLimited,
		500..=599 => GameApiError::UpstreamUnavailable(format!("HTTP {status}")),
		_ => {
			let detail = if message.trim().is_empty() {
				format!("HTTP {status}")
			} else {
				truncate(message.trim(), 200)
			};
			GameApiError::UnknownUpstreamError(detail)
		}
	}
}

fn redact(message: &str, api_key: &SecretString) -> String {
	if api_key.expose().is_empty() {
		return message.to_string();
	}
	message.replace(api_key.expose().as_str(), pnw_common_secret::REDACTED)
}

fn truncate(s: &str, max_chars: usize) -> String {
	if s.chars().count() <= max_chars {
		s.to_string()
	} else {
		let mut out: String = s.chars().take(max_chars).collect();
		out.push('…');
		out
	}
}
