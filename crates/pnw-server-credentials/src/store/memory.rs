// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pnw_server_auth::{AllianceId, ManagerId, OwnerKind, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoredCredential};
use crate::error::StoreError;

#[derive(Default)]
struct Owners {
	users: HashMap<Uuid, Option<StoredCredential>>,
	managers: HashMap<Uuid, (AllianceId, Option<StoredCredential>)>,
}

impl Owners {
	fn slot(&mut self, kind: OwnerKind, owner_id: Uuid) -> Option<&mut Option<StoredCredential>> {
		match kind {
			OwnerKind::User => self.users.get_mut(&owner_id),
			OwnerKind::AllianceManager => self.managers.get_mut(&owner_id).map(|(_, slot)| slot),
		}
	}

	fn holder_of(&self, fingerprint: &str) -> Option<(OwnerKind, Uuid)> {
		let matches = |slot: Option<&StoredCredential>| {
			slot.is_some_and(|credential| credential.fingerprint == fingerprint)
		};
		self.users
			.iter()
			.find(|(_, slot)| matches(slot.as_ref()))
			.map(|(id, _)| (OwnerKind::User, *id))
			.or_else(|| {
				self.managers
					.iter()
					.find(|(_, (_, slot))| matches(slot.as_ref()))
					.map(|(id, _)| (OwnerKind::AllianceManager, *id))
			})
	}
}

/// Store backed by a map, for tests and local experiments.
///
/// Owners must be registered with [`with_user`](Self::with_user) or
/// [`with_manager`](Self::with_manager) before credentials can be put.
#[derive(Default)]
pub struct InMemoryCredentialStore {
	owners: RwLock<Owners>,
	unavailable: AtomicBool,
}

impl InMemoryCredentialStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn with_user(self, user_id: UserId) -> Self {
		self.owners
			.write()
			.await
			.users
			.insert(user_id.into_inner(), None);
		self
	}

	pub async fn with_manager(self, manager_id: ManagerId, alliance_id: AllianceId) -> Self {
		self.owners
			.write()
			.await
			.managers
			.insert(manager_id.into_inner(), (alliance_id, None));
		self
	}

	/// Make every subsequent call fail with [`StoreError::Unavailable`].
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	fn check_available(&self) -> Result<(), StoreError> {
		if self.unavailable.load(Ordering::SeqCst) {
			return Err(StoreError::Unavailable("in-memory store disabled".to_string()));
		}
		Ok(())
	}
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
	async fn get(
		&self,
		kind: OwnerKind,
		owner_id: Uuid,
	) -> Result<Option<StoredCredential>, StoreError> {
		self.check_available()?;
		let owners = self.owners.read().await;
		let slot = match kind {
			OwnerKind::User => owners.users.get(&owner_id),
			OwnerKind::AllianceManager => owners.managers.get(&owner_id).map(|(_, slot)| slot),
		};
		Ok(slot.cloned().flatten())
	}

	async fn put(
		&self,
		kind: OwnerKind,
		owner_id: Uuid,
		credential: &StoredCredential,
	) -> Result<(), StoreError> {
		self.check_available()?;
		let mut owners = self.owners.write().await;
		if let Some(holder) = owners.holder_of(&credential.fingerprint) {
			if holder != (kind, owner_id) {
				return Err(StoreError::FingerprintConflict);
			}
		}
		let slot = owners
			.slot(kind, owner_id)
			.ok_or(StoreError::OwnerNotFound)?;
		*slot = Some(credential.clone());
		Ok(())
	}

	async fn remove(&self, kind: OwnerKind, owner_id: Uuid) -> Result<bool, StoreError> {
		self.check_available()?;
		let mut owners = self.owners.write().await;
		Ok(owners
			.slot(kind, owner_id)
			.and_then(|slot| slot.take())
			.is_some())
	}

	async fn find_by_fingerprint(
		&self,
		fingerprint: &str,
	) -> Result<Option<(OwnerKind, Uuid)>, StoreError> {
		self.check_available()?;
		Ok(self.owners.read().await.holder_of(fingerprint))
	}

	async fn manager_alliance(
		&self,
		manager_id: ManagerId,
	) -> Result<Option<AllianceId>, StoreError> {
		self.check_available()?;
		let owners = self.owners.read().await;
		Ok(owners
			.managers
			.get(manager_id.as_uuid())
			.map(|(alliance_id, _)| *alliance_id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use pnw_server_auth::NationId;

	fn credential(fingerprint: &str) -> StoredCredential {
		StoredCredential {
			ciphertext: "aa:bb:cc:dd".to_string(),
			fingerprint: fingerprint.to_string(),
			nation_id: NationId::new(1),
			nation_name: "Nation".to_string(),
			alliance_id: None,
			alliance_name: None,
			linked_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn unregistered_owner_is_not_found() {
		let store = InMemoryCredentialStore::new();
		let err = store
			.put(OwnerKind::User, Uuid::new_v4(), &credential("fp"))
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::OwnerNotFound));
	}

	#[tokio::test]
	async fn put_get_remove() {
		let user = UserId::generate();
		let store = InMemoryCredentialStore::new().with_user(user).await;

		store
			.put(OwnerKind::User, user.into_inner(), &credential("fp"))
			.await
			.unwrap();
		assert!(store.get(OwnerKind::User, user.into_inner()).await.unwrap().is_some());
		assert_eq!(
			store.find_by_fingerprint("fp").await.unwrap(),
			Some((OwnerKind::User, user.into_inner()))
		);
		assert!(store.remove(OwnerKind::User, user.into_inner()).await.unwrap());
		assert!(!store.remove(OwnerKind::User, user.into_inner()).await.unwrap());
	}

	#[tokio::test]
	async fn fingerprint_is_unique_across_owner_kinds() {
		let user = UserId::generate();
		let manager = ManagerId::generate();
		let store = InMemoryCredentialStore::new()
			.with_user(user)
			.await
			.with_manager(manager, AllianceId::new(7))
			.await;

		store
			.put(OwnerKind::User, user.into_inner(), &credential("fp"))
			.await
			.unwrap();
		let err = store
			.put(OwnerKind::AllianceManager, manager.into_inner(), &credential("fp"))
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::FingerprintConflict));
		assert!(store
			.get(OwnerKind::AllianceManager, manager.into_inner())
			.await
			.unwrap()
			.is_none());

		// Rewriting the holder's own credential is not a conflict.
		store
			.put(OwnerKind::User, user.into_inner(), &credential("fp"))
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn unavailable_store_fails_every_call() {
		let user = UserId::generate();
		let store = InMemoryCredentialStore::new().with_user(user).await;
		store.set_unavailable(true);

		assert!(matches!(
			store.get(OwnerKind::User, user.into_inner()).await,
			Err(StoreError::Unavailable(_))
		));
		store.set_unavailable(false);
		assert!(store.get(OwnerKind::User, user.into_inner()).await.is_ok());
	}
}
