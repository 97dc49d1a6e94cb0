// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuditConfigLayer, CredentialsConfigLayer, DatabaseConfigLayer, GameApiConfigLayer,
	HttpConfigLayer, LogFormat, LoggingConfigLayer, QueueOverflowPolicy, RateLimitConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/pnw/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PNW_SERVER_<SECTION>_<FIELD>. The credential master key is
/// not read here; see [`crate::env::load_secret_env`].
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()?),
			credentials: Some(load_credentials_from_env()?),
			game_api: Some(load_game_api_from_env()?),
			rate_limit: Some(load_rate_limit_from_env()?),
			audit: Some(load_audit_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("PNW_SERVER_HOST"),
		port: env_parse("PNW_SERVER_PORT", "u16")?,
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("PNW_SERVER_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("PNW_SERVER_LOG_FORMAT") {
		Some(v) => Some(
			v.parse::<LogFormat>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "PNW_SERVER_LOG_FORMAT".to_string(),
					message,
				})?,
		),
		None => None,
	};
	Ok(LoggingConfigLayer {
		level: env_var("PNW_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_credentials_from_env() -> Result<CredentialsConfigLayer, ConfigError> {
	Ok(CredentialsConfigLayer {
		pbkdf2_iterations: env_parse("PNW_SERVER_CREDENTIALS_PBKDF2_ITERATIONS", "u32")?,
	})
}

fn load_game_api_from_env() -> Result<GameApiConfigLayer, ConfigError> {
	Ok(GameApiConfigLayer {
		url: env_var("PNW_SERVER_GAME_API_URL"),
		validation_timeout_secs: env_parse("PNW_SERVER_GAME_API_VALIDATION_TIMEOUT_SECS", "u64")?,
		usage_timeout_secs: env_parse("PNW_SERVER_GAME_API_USAGE_TIMEOUT_SECS", "u64")?,
	})
}

fn load_rate_limit_from_env() -> Result<RateLimitConfigLayer, ConfigError> {
	Ok(RateLimitConfigLayer {
		enabled: env_bool("PNW_SERVER_RATE_LIMIT_ENABLED"),
		window_secs: env_parse("PNW_SERVER_RATE_LIMIT_WINDOW_SECS", "u64")?,
		max_requests: env_parse("PNW_SERVER_RATE_LIMIT_MAX_REQUESTS", "u32")?,
	})
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	let queue_overflow_policy = match env_var("PNW_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY") {
		Some(v) => match v.to_ascii_lowercase().as_str() {
			"drop_newest" => Some(QueueOverflowPolicy::DropNewest),
			"block" => Some(QueueOverflowPolicy::Block),
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "PNW_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY".to_string(),
					message: format!("expected 'drop_newest' or 'block', got '{v}'"),
				})
			}
		},
		None => None,
	};
	Ok(AuditConfigLayer {
		enabled: env_bool("PNW_SERVER_AUDIT_ENABLED"),
		queue_capacity: env_parse("PNW_SERVER_AUDIT_QUEUE_CAPACITY", "usize")?,
		queue_overflow_policy,
		sqlite_sink: env_bool("PNW_SERVER_AUDIT_SQLITE_SINK"),
	})
}
