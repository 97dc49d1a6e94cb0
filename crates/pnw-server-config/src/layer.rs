// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	AuditConfigLayer, CredentialsConfigLayer, DatabaseConfigLayer, GameApiConfigLayer,
	HttpConfigLayer, LoggingConfigLayer, RateLimitConfigLayer,
};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub credentials: Option<CredentialsConfigLayer>,
	#[serde(default)]
	pub game_api: Option<GameApiConfigLayer>,
	#[serde(default)]
	pub rate_limit: Option<RateLimitConfigLayer>,
	#[serde(default)]
	pub audit: Option<AuditConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(
			&mut self.credentials,
			other.credentials,
			CredentialsConfigLayer::merge,
		);
		merge_option(&mut self.game_api, other.game_api, GameApiConfigLayer::merge);
		merge_option(
			&mut self.rate_limit,
			other.rate_limit,
			RateLimitConfigLayer::merge,
		);
		merge_option(&mut self.audit, other.audit, AuditConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.http.is_none());
		assert!(base.game_api.is_none());
	}

	#[test]
	fn test_merge_fills_missing_section() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			rate_limit: Some(RateLimitConfigLayer {
				max_requests: Some(5),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(base.rate_limit.unwrap().max_requests, Some(5));
	}

	#[test]
	fn test_merge_field_level_override() {
		let mut base = ServerConfigLayer {
			game_api: Some(GameApiConfigLayer {
				url: Some("http://toml.invalid/graphql".to_string()),
				validation_timeout_secs: Some(20),
				usage_timeout_secs: None,
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			game_api: Some(GameApiConfigLayer {
				url: Some("http://env.invalid/graphql".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		let game_api = base.game_api.unwrap();
		assert_eq!(game_api.url.as_deref(), Some("http://env.invalid/graphql"));
		assert_eq!(game_api.validation_timeout_secs, Some(20));
	}

	#[test]
	fn test_parse_full_toml() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			port = 9090

			[credentials]
			pbkdf2_iterations = 200000

			[rate_limit]
			window_secs = 30

			[logging]
			format = "json"
			"#,
		)
		.unwrap();
		assert_eq!(layer.http.unwrap().port, Some(9090));
		assert_eq!(layer.credentials.unwrap().pbkdf2_iterations, Some(200_000));
		assert_eq!(layer.rate_limit.unwrap().window_secs, Some(30));
		assert!(layer.logging.unwrap().format.is_some());
	}
}
