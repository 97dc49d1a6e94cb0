// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for game API calls.

use thiserror::Error;

/// Classified outcome of a failed validation or usage check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameApiError {
	/// Rejected locally; no request was sent.
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

	/// Any failure during a usage check. Callers degrade rather than fail.
	#[error("usage check failed: {0}")]
	UsageCheckFailed(String),
}

/// Failure below the HTTP response level.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("request timed out")]
	Timeout,

	#[error("connection failed: {0}")]
	Connect(String),

	#[error("failed to read response: {0}")]
	Body(String),
}
