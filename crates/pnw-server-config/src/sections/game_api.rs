// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Politics & War GraphQL API configuration.

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_GAME_API_URL: &str = "https://api.politicsandwar.com/graphql";
const DEFAULT_VALIDATION_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USAGE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct GameApiConfig {
	pub url: String,
	pub validation_timeout: Duration,
	pub usage_timeout: Duration,
}

impl Default for GameApiConfig {
	fn default() -> Self {
		GameApiConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameApiConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub validation_timeout_secs: Option<u64>,
	#[serde(default)]
	pub usage_timeout_secs: Option<u64>,
}

impl GameApiConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.validation_timeout_secs.is_some() {
			self.validation_timeout_secs = other.validation_timeout_secs;
		}
		if other.usage_timeout_secs.is_some() {
			self.usage_timeout_secs = other.usage_timeout_secs;
		}
	}

	pub fn finalize(self) -> GameApiConfig {
		GameApiConfig {
			url: self
				.url
				.unwrap_or_else(|| DEFAULT_GAME_API_URL.to_string()),
			validation_timeout: Duration::from_secs(
				self
					.validation_timeout_secs
					.unwrap_or(DEFAULT_VALIDATION_TIMEOUT_SECS),
			),
			usage_timeout: Duration::from_secs(
				self.usage_timeout_secs.unwrap_or(DEFAULT_USAGE_TIMEOUT_SECS),
			),
		}
	}
}
