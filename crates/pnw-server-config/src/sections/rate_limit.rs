// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-caller rate limiting for routes that call the game API.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
	pub enabled: bool,
	pub window_secs: u64,
	pub max_requests: u32,
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		RateLimitConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitConfigLayer {
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub window_secs: Option<u64>,
	#[serde(default)]
	pub max_requests: Option<u32>,
}

impl RateLimitConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.window_secs.is_some() {
			self.window_secs = other.window_secs;
		}
		if other.max_requests.is_some() {
			self.max_requests = other.max_requests;
		}
	}

	pub fn finalize(self) -> RateLimitConfig {
		RateLimitConfig {
			enabled: self.enabled.unwrap_or(true),
			window_secs: self.window_secs.unwrap_or(60),
			max_requests: self.max_requests.unwrap_or(10),
		}
	}
}
