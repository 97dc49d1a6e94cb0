// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with a consistent User-Agent header.
//!
//! Every outbound request to the Politics & War API goes through a client
//! built here, so upstream operators can identify our traffic.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Connect timeout applied to every client. Per-request timeouts are set by
/// callers because validation and usage checks use different budgets.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates a client builder with the standard User-Agent and connect timeout.
///
/// # Example
/// ```ignore
/// let client = pnw_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.connect_timeout(CONNECT_TIMEOUT)
}

/// Builds a client with the standard settings.
pub fn new_client() -> Result<Client, reqwest::Error> {
	builder().build()
}

/// Returns the User-Agent string: `pnw-dashboard/{version}`.
pub fn user_agent() -> String {
	format!("pnw-dashboard/{}", env!("CARGO_PKG_VERSION"))
}
