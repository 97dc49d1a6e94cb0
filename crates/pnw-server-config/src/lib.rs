// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the PnW dashboard server.
//!
//! Layers are merged in precedence order: built-in defaults, then a TOML file
//! (`/etc/pnw/server.toml` or `--config`), then `PNW_SERVER_*` environment
//! variables. The credential master key is only ever read from the
//! environment (or a `_FILE` indirection) so it never sits in a config file.
//!
//! ```ignore
//! let config = pnw_server_config::load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Environment variable holding the credential master key.
pub const MASTER_KEY_ENV: &str = "PNW_SERVER_CREDENTIALS_MASTER_KEY";

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub credentials: CredentialsConfig,
	pub game_api: GameApiConfig,
	pub rate_limit: RateLimitConfig,
	pub audit: AuditConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	let master_key = load_secret_env(MASTER_KEY_ENV)?;
	finalize(merged, master_key)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(
	layer: ServerConfigLayer,
	master_key: Option<pnw_common_secret::SecretString>,
) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		credentials: layer.credentials.unwrap_or_default().finalize(master_key),
		game_api: layer.game_api.unwrap_or_default().finalize(),
		rate_limit: layer.rate_limit.unwrap_or_default().finalize(),
		audit: layer.audit.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		game_api = %config.game_api.url,
		master_key_configured = config.credentials.master_key.is_some(),
		pbkdf2_iterations = config.credentials.pbkdf2_iterations,
		rate_limit_enabled = config.rate_limit.enabled,
		audit_enabled = config.audit.enabled,
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.credentials.pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
		return Err(ConfigError::Validation(format!(
			"PNW_SERVER_CREDENTIALS_PBKDF2_ITERATIONS must be at least {MIN_PBKDF2_ITERATIONS}, got {}",
			config.credentials.pbkdf2_iterations
		)));
	}
	if config.game_api.validation_timeout.is_zero() || config.game_api.usage_timeout.is_zero() {
		return Err(ConfigError::Validation(
			"game API timeouts must be greater than zero".to_string(),
		));
	}
	if config.rate_limit.window_secs == 0 || config.rate_limit.max_requests == 0 {
		return Err(ConfigError::Validation(
			"rate limit window and max_requests must be greater than zero".to_string(),
		));
	}
	if config.audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit queue_capacity must be greater than zero".to_string(),
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use pnw_common_secret::SecretString;

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 9000,
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "127.0.0.1:9000");
	}

	#[test]
	fn test_finalize_defaults() {
		let config = finalize(ServerConfigLayer::default(), None).unwrap();
		assert_eq!(config.http.port, 8080);
		assert_eq!(config.credentials.pbkdf2_iterations, 100_000);
		assert!(config.credentials.master_key.is_none());
	}

	#[test]
	fn test_finalize_carries_master_key() {
		let config =
			finalize(ServerConfigLayer::default(), Some(SecretString::from("k"))).unwrap();
		assert!(config.credentials.master_key.is_some());
	}

	#[test]
	fn test_low_iterations_rejected() {
		let layer = ServerConfigLayer {
			credentials: Some(CredentialsConfigLayer {
				pbkdf2_iterations: Some(1_000),
			}),
			..Default::default()
		};
		let err = finalize(layer, None).unwrap_err();
		assert!(err.to_string().contains("at least 100000"));
	}

	#[test]
	fn test_zero_rate_limit_window_rejected() {
		let layer = ServerConfigLayer {
			rate_limit: Some(RateLimitConfigLayer {
				window_secs: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(
			finalize(layer, None),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_zero_timeout_rejected() {
		let layer = ServerConfigLayer {
			game_api: Some(GameApiConfigLayer {
				usage_timeout_secs: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(finalize(layer, None).is_err());
	}
}
