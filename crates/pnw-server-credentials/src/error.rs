// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the credential lifecycle.

use pnw_server_auth::DenyReason;
use pnw_server_game_api::GameApiError;
use thiserror::Error;

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Failures inside [`crate::CredentialCipher`]. Messages never include key
/// material or plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
	#[error("credential master key is not configured")]
	MasterKeyUnset,

	#[error("malformed ciphertext: {0}")]
	Malformed(String),

	#[error("authentication tag verification failed")]
	TagMismatch,

	#[error("decrypted value is not valid UTF-8")]
	InvalidUtf8,

	#[error("encryption failed: {0}")]
	Encryption(String),
}

/// Failures from a [`crate::CredentialStore`].
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("owner record not found")]
	OwnerNotFound,

	#[error("credential fingerprint already held by another owner")]
	FingerprintConflict,

	#[error("corrupt row: {0}")]
	Corrupt(String),

	#[error("store unavailable: {0}")]
	Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CredentialError {
	#[error("API key must be at least {min} characters")]
	InvalidFormat { min: usize },

	#[error("API key is invalid or expired")]
	InvalidOrExpired,

	#[error("Politics & War API rate limit exceeded")]
	UpstreamRateLimited,

	#[error("Politics & War API unavailable: {0}")]
	UpstreamUnavailable(String),

	#[error("Politics & War API error: {0}")]
	UnknownUpstreamError(String),

	#[error("stored credential could not be decrypted: {0}")]
	DecryptionError(CipherError),

	/// Encrypting a new credential failed, usually because no master key is set.
	#[error("credential encryption unavailable: {0}")]
	EncryptionUnavailable(CipherError),

	#[error("access denied: {0}")]
	AccessDenied(DenyReason),

	#[error("this API key is already linked to another account")]
	AlreadyLinkedElsewhere,

	#[error("usage check failed: {0}")]
	UsageCheckFailed(String),

	#[error("credential owner not found")]
	OwnerNotFound,

	#[error("owner_id is required for alliance manager credentials")]
	MissingOwnerId,

	#[error("credential store unavailable: {0}")]
	StoreUnavailable(String),
}

impl CredentialError {
	/// Stable machine-readable kind, used as the `error` field of responses.
	pub fn kind(&self) -> &'static str {
		match self {
			CredentialError::InvalidFormat { .. } => "invalid_format",
			CredentialError::InvalidOrExpired => "invalid_or_expired",
			CredentialError::UpstreamRateLimited => "upstream_rate_limited",
			CredentialError::UpstreamUnavailable(_) => "upstream_unavailable",
			CredentialError::UnknownUpstreamError(_) => "unknown_upstream_error",
			CredentialError::DecryptionError(_) => "decryption_error",
			CredentialError::EncryptionUnavailable(_) => "encryption_unavailable",
			CredentialError::AccessDenied(_) => "access_denied",
			CredentialError::AlreadyLinkedElsewhere => "already_linked_elsewhere",
			CredentialError::UsageCheckFailed(_) => "usage_check_failed",
			CredentialError::OwnerNotFound => "owner_not_found",
			CredentialError::MissingOwnerId => "invalid_request",
			CredentialError::StoreUnavailable(_) => "store_unavailable",
		}
	}
}

impl From<GameApiError> for CredentialError {
	fn from(e: GameApiError) -> Self {
		match e {
			GameApiError::InvalidFormat { min } => CredentialError::InvalidFormat { min },
			GameApiError::InvalidOrExpired => CredentialError::InvalidOrExpired,
			GameApiError::UpstreamRateLimited => CredentialError::UpstreamRateLimited,
			GameApiError::UpstreamUnavailable(msg) => CredentialError::UpstreamUnavailable(msg),
			GameApiError::UnknownUpstreamError(msg) => CredentialError::UnknownUpstreamError(msg),
			GameApiError::UsageCheckFailed(msg) => CredentialError::UsageCheckFailed(msg),
		}
	}
}

impl From<StoreError> for CredentialError {
	fn from(e: StoreError) -> Self {
		match e {
			StoreError::OwnerNotFound => CredentialError::OwnerNotFound,
			StoreError::FingerprintConflict => CredentialError::AlreadyLinkedElsewhere,
			other => CredentialError::StoreUnavailable(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn game_api_errors_keep_their_kind() {
		assert_eq!(
			CredentialError::from(GameApiError::InvalidFormat { min: 20 }).kind(),
			"invalid_format"
		);
		assert_eq!(
			CredentialError::from(GameApiError::UpstreamRateLimited).kind(),
			"upstream_rate_limited"
		);
		assert_eq!(
			CredentialError::from(GameApiError::UpstreamUnavailable("timeout".into())).kind(),
			"upstream_unavailable"
		);
	}

	#[test]
	fn store_errors_become_store_unavailable() {
		let err = CredentialError::from(StoreError::Unavailable("pool closed".into()));
		assert_eq!(err.kind(), "store_unavailable");
		assert_eq!(
			CredentialError::from(StoreError::OwnerNotFound).kind(),
			"owner_not_found"
		);
		assert_eq!(
			CredentialError::from(StoreError::FingerprintConflict).kind(),
			"already_linked_elsewhere"
		);
	}

	#[test]
	fn access_denied_message_includes_reason() {
		let err = CredentialError::AccessDenied(DenyReason::InsufficientPrivilege);
		assert_eq!(err.to_string(), "access denied: insufficient privilege");
	}
}
