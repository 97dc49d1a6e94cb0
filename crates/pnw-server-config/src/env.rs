// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from `VAR` or `VAR_FILE`.
//!
//! The credential master key is normally mounted as a file by the
//! orchestrator, so `PNW_SERVER_CREDENTIALS_MASTER_KEY_FILE` wins over the
//! plain variable when both are set.

use std::path::{Path, PathBuf};
use std::{env, fs};

use pnw_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load a secret from `{var}_FILE` (preferred) or `{var}`.
///
/// Empty values count as unset. A single trailing newline is stripped from
/// file contents.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path) = env::var(&file_var) {
		if path.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}
		return read_secret_file(Path::new(&path)).map(Some);
	}

	match env::var(var) {
		Ok(value) if !value.is_empty() => Ok(Some(SecretString::new(value))),
		_ => Ok(None),
	}
}

/// Read a secret from a file, stripping one trailing newline.
pub fn read_secret_file(path: &Path) -> Result<SecretString, SecretEnvError> {
	let content = fs::read_to_string(path).map_err(|e| SecretEnvError::Io {
		path: path.to_path_buf(),
		source: e,
	})?;
	let trimmed = content
		.strip_suffix("\r\n")
		.or_else(|| content.strip_suffix('\n'))
		.unwrap_or(&content);
	Ok(SecretString::new(trimmed.to_string()))
}
