// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Encrypted storage and lifecycle for Politics & War API keys.
//!
//! - [`CredentialCipher`]: AES-256-GCM under a PBKDF2-derived key, one fresh
//!   salt and IV per value
//! - [`mask`]: the only form of a key that leaves the server
//! - [`CredentialStore`]: one credential per owner record, SQLite or in memory
//! - [`CredentialService`]: link, status, unlink and validate, each gated by
//!   [`pnw_server_auth::authorize`]

pub mod cipher;
pub mod error;
pub mod mask;
pub mod service;
pub mod store;

pub use cipher::{CredentialCipher, SelfCheck};
pub use error::{CipherError, CredentialError, CredentialResult, StoreError};
pub use mask::{mask, DEFAULT_VISIBLE_CHARS};
pub use service::{CredentialService, CredentialStatus, LinkOutcome};
pub use store::{CredentialStore, InMemoryCredentialStore, SqliteCredentialStore, StoredCredential};
