// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential encryption configuration.
//!
//! The master key is never read from TOML; it comes only from
//! `PNW_SERVER_CREDENTIALS_MASTER_KEY` or its `_FILE` variant and is passed
//! to [`CredentialsConfigLayer::finalize`] separately.

use pnw_common_secret::SecretString;
use serde::Deserialize;

/// Lower bound for PBKDF2-HMAC-SHA256 rounds used to derive per-key AES keys.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct CredentialsConfig {
	/// `None` leaves the server running with credential endpoints degraded.
	pub master_key: Option<SecretString>,
	pub pbkdf2_iterations: u32,
}

impl Default for CredentialsConfig {
	fn default() -> Self {
		CredentialsConfigLayer::default().finalize(None)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfigLayer {
	#[serde(default)]
	pub pbkdf2_iterations: Option<u32>,
}

impl CredentialsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.pbkdf2_iterations.is_some() {
			self.pbkdf2_iterations = other.pbkdf2_iterations;
		}
	}

	pub fn finalize(self, master_key: Option<SecretString>) -> CredentialsConfig {
		CredentialsConfig {
			master_key: master_key.filter(|k| !k.is_blank()),
			pbkdf2_iterations: self.pbkdf2_iterations.unwrap_or(MIN_PBKDF2_ITERATIONS),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_to_minimum_iterations_and_no_key() {
		let config = CredentialsConfig::default();
		assert_eq!(config.pbkdf2_iterations, MIN_PBKDF2_ITERATIONS);
		assert!(config.master_key.is_none());
	}

	#[test]
	fn blank_master_key_is_treated_as_unset() {
		let config = CredentialsConfigLayer::default().finalize(Some(SecretString::from("  ")));
		assert!(config.master_key.is_none());
	}

	#[test]
	fn master_key_is_kept() {
		let config =
			CredentialsConfigLayer::default().finalize(Some(SecretString::from("master-key")));
		assert_eq!(config.master_key.unwrap().expose(), "master-key");
	}

	#[test]
	fn toml_cannot_carry_master_key() {
		let layer: CredentialsConfigLayer =
			toml::from_str("pbkdf2_iterations = 250000\nmaster_key = \"nope\"").unwrap();
		assert_eq!(layer.pbkdf2_iterations, Some(250_000));
	}
}
