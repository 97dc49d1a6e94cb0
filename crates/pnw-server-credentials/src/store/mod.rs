// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for encrypted credentials.
//!
//! A store holds at most one credential per `(OwnerKind, owner id)`. Writes
//! replace whatever was there; there is no optimistic concurrency.

mod memory;
mod sqlite;

pub use memory::InMemoryCredentialStore;
pub use sqlite::SqliteCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pnw_server_auth::{AllianceId, ManagerId, NationId, OwnerKind};
use uuid::Uuid;

use crate::error::StoreError;

/// An encrypted credential plus the non-secret metadata captured when it was
/// linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
	/// `salt:iv:tag:ciphertext`, see [`crate::CredentialCipher`].
	pub ciphertext: String,
	/// HMAC-SHA256 of the plaintext, keyed with the master key.
	pub fingerprint: String,
	pub nation_id: NationId,
	pub nation_name: String,
	pub alliance_id: Option<AllianceId>,
	pub alliance_name: Option<String>,
	pub linked_at: DateTime<Utc>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
	async fn get(&self, kind: OwnerKind, owner_id: Uuid)
		-> Result<Option<StoredCredential>, StoreError>;

	/// Replace the owner's credential. Fails with [`StoreError::OwnerNotFound`]
	/// when the owning record does not exist, and with
	/// [`StoreError::FingerprintConflict`] when any other owner, of either kind,
	/// already holds a credential with the same fingerprint. The conflict check
	/// and the write are atomic.
	async fn put(
		&self,
		kind: OwnerKind,
		owner_id: Uuid,
		credential: &StoredCredential,
	) -> Result<(), StoreError>;

	/// Clear the owner's credential. Returns whether one was present.
	async fn remove(&self, kind: OwnerKind, owner_id: Uuid) -> Result<bool, StoreError>;

	/// Owner of the credential with this fingerprint, searching both owner
	/// kinds.
	async fn find_by_fingerprint(
		&self,
		fingerprint: &str,
	) -> Result<Option<(OwnerKind, Uuid)>, StoreError>;

	/// Alliance an alliance-manager record belongs to.
	async fn manager_alliance(&self, manager_id: ManagerId)
		-> Result<Option<AllianceId>, StoreError>;
}
