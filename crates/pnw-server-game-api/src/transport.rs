// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport for GraphQL queries.

use std::time::Duration;

use async_trait::async_trait;
use pnw_common_secret::SecretString;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::TransportError;

/// Raw upstream response. Classification happens in the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
	pub status: u16,
	pub body: String,
}

#[async_trait]
pub trait GameApiTransport: Send + Sync {
	/// Send one GraphQL `query` authenticated with `api_key`.
	async fn query(
		&self,
		api_key: &SecretString,
		query: &str,
		timeout: Duration,
	) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
	query: &'a str,
}

/// `POST {base_url}?api_key=<key>` with a JSON `{"query": ...}` body.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	http_client: Client,
	base_url: String,
}

impl ReqwestTransport {
	pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
		Ok(Self {
			http_client: pnw_common_http::new_client()?,
			base_url: base_url.into(),
		})
	}

	pub fn with_client(http_client: Client, base_url: impl Into<String>) -> Self {
		Self {
			http_client,
			base_url: base_url.into(),
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}
}

#[async_trait]
impl GameApiTransport for ReqwestTransport {
	#[instrument(skip(self, api_key, query), fields(url = %self.base_url, timeout_ms = timeout.as_millis() as u64))]
	async fn query(
		&self,
		api_key: &SecretString,
		query: &str,
		timeout: Duration,
	) -> Result<TransportResponse, TransportError> {
		let response = self
			.http_client
			.post(&self.base_url)
			.query(&[("api_key", api_key.expose().as_str())])
			.timeout(timeout)
			.json(&GraphQlRequest { query })
			.send()
			.await
			.map_err(classify_reqwest_error)?;

		let status = response.status().as_u16();
		debug!(status, "received response from game API");

		let body = response
			.text()
			.await
			.map_err(|e| match classify_reqwest_error(e) {
				TransportError::Connect(msg) => TransportError::Body(msg),
				other => other,
			})?;

		Ok(TransportResponse { status, body })
	}
}

/// The request URL carries the key, so it is stripped before the error
/// reaches a log line or a response.
fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
	let e = e.without_url();
	if e.is_timeout() {
		warn!("game API request timed out");
		return TransportError::Timeout;
	}
	warn!(error = %e, "game API request failed");
	TransportError::Connect(e.to_string())
}
