// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer session tokens.
//!
//! Tokens are stored as SHA-256 hex digests; the plaintext only ever exists
//! in the request header.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use sha2::{Digest, Sha256};
use tracing::instrument;

/// Extract the token from an `Authorization: Bearer <token>` header.
#[instrument(level = "trace", skip_all)]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let auth_header = headers.get(AUTHORIZATION)?;
	let auth_str = auth_header.to_str().ok()?;
	auth_str
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(|token| token.to_string())
}

/// SHA-256 hex digest used as the `sessions.token_hash` lookup key.
pub fn hash_token(token: &str) -> String {
	hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::HeaderValue;
	use proptest::prelude::*;

	#[test]
	fn extracts_bearer_token() {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
		assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc123"));
	}

	#[test]
	fn rejects_other_schemes_and_empty_tokens() {
		let mut headers = HeaderMap::new();
		assert_eq!(extract_bearer_token(&headers), None);

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
		assert_eq!(extract_bearer_token(&headers), None);

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
		assert_eq!(extract_bearer_token(&headers), None);
	}

	#[test]
	fn hash_is_known_sha256() {
		assert_eq!(
			hash_token("abc"),
			"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
		);
	}

	proptest! {
		#[test]
		fn hash_is_64_lowercase_hex(token in ".{1,128}") {
			let digest = hash_token(&token);
			prop_assert_eq!(digest.len(), 64);
			prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
		}
	}
}
