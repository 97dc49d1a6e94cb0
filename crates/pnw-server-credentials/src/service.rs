// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The credential lifecycle: link, status, unlink and validate.
//!
//! Every operation takes the resolved [`Caller`] and checks the access policy
//! before touching the validator or the store. Plaintext keys only leave this
//! module as masked views.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pnw_common_secret::SecretString;
use pnw_server_audit::{AuditEventType, AuditLogEntry, AuditService};
use pnw_server_auth::{
	authorize, AccessDecision, Action, Caller, CredentialOwner, DenyReason, ManagerId,
	OwnerKind, UserId,
};
use pnw_server_game_api::{
	AllianceIdentity, KeyValidator, NationIdentity, UsageSnapshot, ValidationResult,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cipher::CredentialCipher;
use crate::error::{CipherError, CredentialError, CredentialResult, StoreError};
use crate::mask::{mask, DEFAULT_VISIBLE_CHARS};
use crate::store::{CredentialStore, StoredCredential};

/// Result of a successful link.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
	pub result: ValidationResult,
	pub masked_view: String,
	/// True when the owner already had a credential that was replaced.
	pub relinked: bool,
}

/// What a caller may see about a stored credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialStatus {
	pub is_linked: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub masked_view: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub identity: Option<NationIdentity>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub alliance: Option<AllianceIdentity>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub linked_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub usage: Option<UsageSnapshot>,
	/// Set when the live usage check failed; the rest of the status is still
	/// valid.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl CredentialStatus {
	fn unlinked() -> Self {
		Self {
			is_linked: false,
			masked_view: None,
			identity: None,
			alliance: None,
			linked_at: None,
			usage: None,
			error: None,
		}
	}
}

#[derive(Clone)]
pub struct CredentialService {
	store: Arc<dyn CredentialStore>,
	validator: Arc<dyn KeyValidator>,
	cipher: Arc<CredentialCipher>,
	audit: Option<AuditService>,
}

impl CredentialService {
	pub fn new(
		store: Arc<dyn CredentialStore>,
		validator: Arc<dyn KeyValidator>,
		cipher: Arc<CredentialCipher>,
	) -> Self {
		Self {
			store,
			validator,
			cipher,
			audit: None,
		}
	}

	pub fn with_audit(mut self, audit: AuditService) -> Self {
		self.audit = Some(audit);
		self
	}

	pub fn cipher(&self) -> &CredentialCipher {
		&self.cipher
	}

	/// Turn the request's `(owner_kind, owner_id)` into a policy subject.
	///
	/// A user credential defaults to the caller's own record. An unknown
	/// manager record is reported as not found only to system admins; anyone
	/// else is denied, so record existence does not leak.
	#[instrument(skip(self, caller), fields(user_id = %caller.user_id, owner_kind = %kind))]
	pub async fn resolve_owner(
		&self,
		caller: &Caller,
		kind: OwnerKind,
		owner_id: Option<Uuid>,
	) -> CredentialResult<CredentialOwner> {
		match kind {
			OwnerKind::User => Ok(CredentialOwner::User(
				owner_id.map(UserId::new).unwrap_or(caller.user_id),
			)),
			OwnerKind::AllianceManager => {
				let manager_id = ManagerId::new(owner_id.ok_or(CredentialError::MissingOwnerId)?);
				match self.store.manager_alliance(manager_id).await? {
					Some(alliance_id) => Ok(CredentialOwner::AllianceManager {
						manager_id,
						alliance_id,
					}),
					None if caller.is_system_admin() => Err(CredentialError::OwnerNotFound),
					None => Err(CredentialError::AccessDenied(
						DenyReason::InsufficientPrivilege,
					)),
				}
			}
		}
	}

	async fn check_access(
		&self,
		caller: &Caller,
		owner: &CredentialOwner,
		action: Action,
	) -> CredentialResult<()> {
		match authorize(caller, owner, action) {
			AccessDecision::Allow => Ok(()),
			AccessDecision::Deny(reason) => {
				self.record(
					AuditLogEntry::builder(AuditEventType::CredentialAccessDenied)
						.actor(caller.user_id)
						.resource(owner.kind().as_str(), owner.id_string())
						.action(action_name(action))
						.details(json!({ "reason": reason.to_string() }))
						.build(),
				)
				.await;
				Err(CredentialError::AccessDenied(reason))
			}
		}
	}

	/// Validate `secret` upstream, encrypt it and store it for the owner.
	#[instrument(skip(self, caller, secret), fields(user_id = %caller.user_id, owner_kind = %kind))]
	pub async fn link(
		&self,
		caller: &Caller,
		kind: OwnerKind,
		owner_id: Option<Uuid>,
		secret: &SecretString,
	) -> CredentialResult<LinkOutcome> {
		let owner = self.resolve_owner(caller, kind, owner_id).await?;
		self.check_access(caller, &owner, Action::Link).await?;

		if !self.cipher.is_configured() {
			warn!("link refused: credential master key is not configured");
			return Err(CredentialError::EncryptionUnavailable(
				CipherError::MasterKeyUnset,
			));
		}

		let result = self.validate_upstream(caller, Some(&owner), secret).await?;

		let owner_uuid = owner_uuid(&owner);
		let fingerprint = self
			.cipher
			.fingerprint(secret.expose())
			.map_err(CredentialError::EncryptionUnavailable)?;
		if let Some(holder) = self.store.find_by_fingerprint(&fingerprint).await? {
			if holder != (kind, owner_uuid) {
				info!(holder_kind = %holder.0, "link refused: key already linked to another owner");
				return Err(CredentialError::AlreadyLinkedElsewhere);
			}
		}

		let ciphertext = self
			.cipher
			.encrypt(secret.expose())
			.map_err(CredentialError::EncryptionUnavailable)?;

		let relinked = self.store.get(kind, owner_uuid).await?.is_some();
		let stored = StoredCredential {
			ciphertext,
			fingerprint,
			nation_id: result.nation.id,
			nation_name: result.nation.name.clone(),
			alliance_id: result.alliance.as_ref().map(|a| a.id),
			alliance_name: result.alliance.as_ref().map(|a| a.name.clone()),
			linked_at: Utc::now(),
		};
		if let Err(e) = self.store.put(kind, owner_uuid, &stored).await {
			if matches!(e, StoreError::FingerprintConflict) {
				info!("link refused: key linked to another owner concurrently");
			}
			return Err(e.into());
		}

		let masked_view = mask(secret.expose(), DEFAULT_VISIBLE_CHARS);
		let event_type = if relinked {
			AuditEventType::CredentialRelinked
		} else {
			AuditEventType::CredentialLinked
		};
		self.record(
			AuditLogEntry::builder(event_type)
				.actor(caller.user_id)
				.resource(owner.kind().as_str(), owner.id_string())
				.action("link")
				.details(json!({
					"masked_view": masked_view,
					"nation_id": result.nation.id,
				}))
				.build(),
		)
		.await;

		info!(
			owner_id = %owner_uuid,
			nation_id = %result.nation.id,
			relinked,
			"credential linked"
		);
		Ok(LinkOutcome {
			result,
			masked_view,
			relinked,
		})
	}

	/// Report whether the owner has a credential and, if so, its masked view,
	/// identity and live usage. A failed usage check is reported in `error`
	/// rather than failing the call.
	#[instrument(skip(self, caller), fields(user_id = %caller.user_id, owner_kind = %kind))]
	pub async fn status(
		&self,
		caller: &Caller,
		kind: OwnerKind,
		owner_id: Option<Uuid>,
	) -> CredentialResult<CredentialStatus> {
		let owner = self.resolve_owner(caller, kind, owner_id).await?;
		self.check_access(caller, &owner, Action::ViewStatus).await?;

		let Some(stored) = self.store.get(kind, owner_uuid(&owner)).await? else {
			return Ok(CredentialStatus::unlinked());
		};

		let plaintext = self
			.cipher
			.decrypt(&stored.ciphertext)
			.map_err(|e| {
				warn!(error = %e, "stored credential could not be decrypted");
				CredentialError::DecryptionError(e)
			})?;

		let (usage, error) = match self.validator.check_usage(&plaintext).await {
			Ok(usage) => (Some(usage), None),
			Err(e) => (None, Some(e.to_string())),
		};

		Ok(CredentialStatus {
			is_linked: true,
			masked_view: Some(mask(plaintext.expose(), DEFAULT_VISIBLE_CHARS)),
			identity: Some(NationIdentity {
				id: stored.nation_id,
				name: stored.nation_name,
			}),
			alliance: stored
				.alliance_id
				.zip(stored.alliance_name)
				.map(|(id, name)| AllianceIdentity { id, name }),
			linked_at: Some(stored.linked_at),
			usage,
			error,
		})
	}

	/// Remove the owner's credential. Succeeds when nothing was linked;
	/// returns whether a credential was removed.
	#[instrument(skip(self, caller), fields(user_id = %caller.user_id, owner_kind = %kind))]
	pub async fn unlink(
		&self,
		caller: &Caller,
		kind: OwnerKind,
		owner_id: Option<Uuid>,
	) -> CredentialResult<bool> {
		let owner = self.resolve_owner(caller, kind, owner_id).await?;
		self.check_access(caller, &owner, Action::Unlink).await?;

		let was_linked = self.store.remove(kind, owner_uuid(&owner)).await?;
		self.record(
			AuditLogEntry::builder(AuditEventType::CredentialUnlinked)
				.actor(caller.user_id)
				.resource(owner.kind().as_str(), owner.id_string())
				.action("unlink")
				.details(json!({ "was_linked": was_linked }))
				.build(),
		)
		.await;

		debug!(was_linked, "credential unlinked");
		Ok(was_linked)
	}

	/// Check a key upstream without storing it.
	#[instrument(skip(self, caller, secret), fields(user_id = %caller.user_id))]
	pub async fn validate(
		&self,
		caller: &Caller,
		secret: &SecretString,
	) -> CredentialResult<ValidationResult> {
		self.validate_upstream(caller, None, secret).await
	}

	async fn validate_upstream(
		&self,
		caller: &Caller,
		owner: Option<&CredentialOwner>,
		secret: &SecretString,
	) -> CredentialResult<ValidationResult> {
		let action = if owner.is_some() { "link" } else { "validate" };
		let resource = owner.map(|o| (o.kind().as_str(), o.id_string()));

		match self.validator.validate(secret).await {
			Ok(result) => {
				let mut entry = AuditLogEntry::builder(AuditEventType::CredentialValidated)
					.actor(caller.user_id)
					.action(action)
					.details(json!({
						"masked_view": mask(secret.expose(), DEFAULT_VISIBLE_CHARS),
						"nation_id": result.nation.id,
					}));
				if let Some((kind, id)) = resource {
					entry = entry.resource(kind, id);
				}
				self.record(entry.build()).await;
				Ok(result)
			}
			Err(e) => {
				let err = CredentialError::from(e);
				let mut entry = AuditLogEntry::builder(AuditEventType::CredentialValidationFailed)
					.actor(caller.user_id)
					.action(action)
					.details(json!({ "error": err.kind() }));
				if let Some((kind, id)) = resource {
					entry = entry.resource(kind, id);
				}
				self.record(entry.build()).await;
				Err(err)
			}
		}
	}

	async fn record(&self, entry: AuditLogEntry) {
		if let Some(audit) = &self.audit {
			audit.log(entry).await;
		}
	}
}

fn owner_uuid(owner: &CredentialOwner) -> Uuid {
	match owner {
		CredentialOwner::User(id) => id.into_inner(),
		CredentialOwner::AllianceManager { manager_id, .. } => manager_id.into_inner(),
	}
}

fn action_name(action: Action) -> &'static str {
	match action {
		Action::ViewStatus => "view_status",
		Action::Link => "link",
		Action::Unlink => "unlink",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::InMemoryCredentialStore;
	use async_trait::async_trait;
	use pnw_server_audit::{AuditSink, AuditSinkError, QueueOverflowPolicy};
	use pnw_server_auth::{AllianceId, GlobalRole, ManagerGrant, ManagerRole, NationId};
	use pnw_server_game_api::GameApiError;
	use std::collections::BTreeSet;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;
	use tokio::time::{sleep, Duration};

	const KEY: &str = "abcdefghijklmnopqrstuvwx";
	const OTHER_KEY: &str = "zyxwvutsrqponmlkjihgfedc";

	struct StubValidator {
		validate_calls: AtomicUsize,
		usage: Mutex<Result<UsageSnapshot, GameApiError>>,
	}

	impl StubValidator {
		fn new() -> Self {
			Self {
				validate_calls: AtomicUsize::new(0),
				usage: Mutex::new(Ok(UsageSnapshot::new(10, 2000))),
			}
		}

		fn failing_usage(self) -> Self {
			*self.usage.lock().unwrap() =
				Err(GameApiError::UsageCheckFailed("HTTP 500".to_string()));
			self
		}
	}

	#[async_trait]
	impl KeyValidator for StubValidator {
		async fn validate(&self, api_key: &SecretString) -> Result<ValidationResult, GameApiError> {
			self.validate_calls.fetch_add(1, Ordering::SeqCst);
			if api_key.char_len() < 20 {
				return Err(GameApiError::InvalidFormat { min: 20 });
			}
			if api_key.expose().starts_with("bad") {
				return Err(GameApiError::InvalidOrExpired);
			}
			Ok(ValidationResult {
				nation: NationIdentity {
					id: NationId::new(42),
					name: "Testland".to_string(),
				},
				alliance: Some(AllianceIdentity {
					id: AllianceId::new(7),
					name: "Test Alliance".to_string(),
				}),
				capabilities: BTreeSet::from(["nation_view".to_string()]),
				usage: UsageSnapshot::new(10, 2000),
			})
		}

		async fn check_usage(&self, _api_key: &SecretString) -> Result<UsageSnapshot, GameApiError> {
			self.usage.lock().unwrap().clone()
		}
	}

	#[derive(Default)]
	struct CollectingSink {
		entries: Mutex<Vec<Arc<AuditLogEntry>>>,
	}

	impl CollectingSink {
		/// Sinks publish concurrently, so compare without ordering.
		fn event_types(&self) -> Vec<AuditEventType> {
			let mut types: Vec<AuditEventType> = self
				.entries
				.lock()
				.unwrap()
				.iter()
				.map(|e| e.event_type)
				.collect();
			types.sort_by_key(|t| t.to_string());
			types
		}
	}

	#[async_trait]
	impl AuditSink for CollectingSink {
		fn name(&self) -> &str {
			"collecting"
		}

		async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
			self.entries.lock().unwrap().push(entry);
			Ok(())
		}
	}

	struct Fixture {
		service: CredentialService,
		store: Arc<InMemoryCredentialStore>,
		validator: Arc<StubValidator>,
		cipher: Arc<CredentialCipher>,
		sink: Arc<CollectingSink>,
		user: UserId,
		manager: ManagerId,
	}

	async fn fixture_with(validator: StubValidator) -> Fixture {
		let user = UserId::generate();
		let manager = ManagerId::generate();
		let store = Arc::new(
			InMemoryCredentialStore::new()
				.with_user(user)
				.await
				.with_manager(manager, AllianceId::new(7))
				.await,
		);
		let validator = Arc::new(validator);
		let cipher = Arc::new(CredentialCipher::new(
			SecretString::from("service-test-master-key"),
			1_000,
		));
		let sink = Arc::new(CollectingSink::default());
		let audit = AuditService::new(64, QueueOverflowPolicy::DropNewest, vec![sink.clone()]);
		let service = CredentialService::new(store.clone(), validator.clone(), cipher.clone())
			.with_audit(audit);
		Fixture {
			service,
			store,
			validator,
			cipher,
			sink,
			user,
			manager,
		}
	}

	async fn fixture() -> Fixture {
		fixture_with(StubValidator::new()).await
	}

	fn manager_grant(role: ManagerRole) -> ManagerGrant {
		ManagerGrant {
			manager_id: ManagerId::generate(),
			alliance_id: AllianceId::new(7),
			role,
			is_active: true,
		}
	}

	async fn settle() {
		sleep(Duration::from_millis(50)).await;
	}

	#[tokio::test]
	async fn link_then_status_end_to_end() {
		let f = fixture().await;
		let caller = Caller::new(f.user);
		let secret = SecretString::from(KEY);

		let outcome = f
			.service
			.link(&caller, OwnerKind::User, None, &secret)
			.await
			.unwrap();
		assert!(!outcome.relinked);
		assert_eq!(outcome.masked_view, "abcd********uvwx");
		assert_eq!(outcome.result.nation.id, NationId::new(42));

		let stored = f
			.store
			.get(OwnerKind::User, f.user.into_inner())
			.await
			.unwrap()
			.unwrap();
		assert_ne!(stored.ciphertext, KEY);
		assert_eq!(f.cipher.decrypt(&stored.ciphertext).unwrap().expose(), KEY);

		let status = f
			.service
			.status(&caller, OwnerKind::User, None)
			.await
			.unwrap();
		assert!(status.is_linked);
		assert_eq!(status.masked_view.as_deref(), Some("abcd********uvwx"));
		assert_eq!(status.identity.as_ref().unwrap().name, "Testland");
		assert_eq!(status.usage.as_ref().unwrap().percentage_used, 0.5);
		assert!(status.error.is_none());

		settle().await;
		assert_eq!(
			f.sink.event_types(),
			vec![
				AuditEventType::CredentialLinked,
				AuditEventType::CredentialValidated
			]
		);
	}

	#[tokio::test]
	async fn relink_replaces_and_is_reported() {
		let f = fixture().await;
		let caller = Caller::new(f.user);

		f.service
			.link(&caller, OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap();
		let outcome = f
			.service
			.link(&caller, OwnerKind::User, None, &SecretString::from(OTHER_KEY))
			.await
			.unwrap();
		assert!(outcome.relinked);

		let stored = f
			.store
			.get(OwnerKind::User, f.user.into_inner())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(
			f.cipher.decrypt(&stored.ciphertext).unwrap().expose(),
			OTHER_KEY
		);

		settle().await;
		assert!(f
			.sink
			.event_types()
			.contains(&AuditEventType::CredentialRelinked));
	}

	#[tokio::test]
	async fn relinking_the_same_key_to_the_same_owner_is_allowed() {
		let f = fixture().await;
		let caller = Caller::new(f.user);
		let secret = SecretString::from(KEY);

		f.service
			.link(&caller, OwnerKind::User, None, &secret)
			.await
			.unwrap();
		assert!(f
			.service
			.link(&caller, OwnerKind::User, None, &secret)
			.await
			.unwrap()
			.relinked);
	}

	#[tokio::test]
	async fn same_key_for_another_user_conflicts() {
		let f = fixture().await;
		let other = UserId::generate();
		let store = Arc::new(
			InMemoryCredentialStore::new()
				.with_user(f.user)
				.await
				.with_user(other)
				.await,
		);
		let service = CredentialService::new(store, f.validator.clone(), f.cipher.clone());
		let secret = SecretString::from(KEY);

		service
			.link(&Caller::new(f.user), OwnerKind::User, None, &secret)
			.await
			.unwrap();
		let err = service
			.link(&Caller::new(other), OwnerKind::User, None, &secret)
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::AlreadyLinkedElsewhere));
	}

	#[tokio::test]
	async fn same_key_on_a_manager_record_of_another_user_conflicts() {
		let f = fixture().await;
		let secret = SecretString::from(KEY);
		f.service
			.link(&Caller::new(f.user), OwnerKind::User, None, &secret)
			.await
			.unwrap();

		let bob = Caller::new(UserId::generate()).with_grant(manager_grant(ManagerRole::Admin));
		let err = f
			.service
			.link(
				&bob,
				OwnerKind::AllianceManager,
				Some(f.manager.into_inner()),
				&secret,
			)
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::AlreadyLinkedElsewhere));
		assert!(f
			.store
			.get(OwnerKind::AllianceManager, f.manager.into_inner())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn own_personal_key_cannot_also_back_a_manager_record() {
		let f = fixture().await;
		let caller = Caller::new(f.user).with_grant(manager_grant(ManagerRole::Admin));
		let secret = SecretString::from(KEY);

		f.service
			.link(&caller, OwnerKind::User, None, &secret)
			.await
			.unwrap();
		let err = f
			.service
			.link(
				&caller,
				OwnerKind::AllianceManager,
				Some(f.manager.into_inner()),
				&secret,
			)
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::AlreadyLinkedElsewhere));
	}

	#[tokio::test]
	async fn concurrent_links_of_one_key_admit_a_single_owner() {
		let f = fixture().await;
		let other = UserId::generate();
		let store = Arc::new(
			InMemoryCredentialStore::new()
				.with_user(f.user)
				.await
				.with_user(other)
				.await,
		);
		let service = CredentialService::new(store, f.validator.clone(), f.cipher.clone());
		let secret = SecretString::from(KEY);
		let alice = Caller::new(f.user);
		let bob = Caller::new(other);

		let (a, b) = tokio::join!(
			service.link(&alice, OwnerKind::User, None, &secret),
			service.link(&bob, OwnerKind::User, None, &secret),
		);

		let outcomes = [a, b];
		assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
		assert!(outcomes
			.iter()
			.any(|r| matches!(r, Err(CredentialError::AlreadyLinkedElsewhere))));
	}

	#[tokio::test]
	async fn short_key_is_rejected_and_nothing_is_stored() {
		let f = fixture().await;
		let caller = Caller::new(f.user);

		let err = f
			.service
			.link(&caller, OwnerKind::User, None, &SecretString::from("short"))
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::InvalidFormat { min: 20 }));
		assert!(f
			.store
			.get(OwnerKind::User, f.user.into_inner())
			.await
			.unwrap()
			.is_none());

		settle().await;
		assert_eq!(
			f.sink.event_types(),
			vec![AuditEventType::CredentialValidationFailed]
		);
	}

	#[tokio::test]
	async fn invalid_key_leaves_existing_credential_untouched() {
		let f = fixture().await;
		let caller = Caller::new(f.user);

		f.service
			.link(&caller, OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap();
		let err = f
			.service
			.link(
				&caller,
				OwnerKind::User,
				None,
				&SecretString::from("bad-key-that-is-long-enough"),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::InvalidOrExpired));

		let stored = f
			.store
			.get(OwnerKind::User, f.user.into_inner())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(f.cipher.decrypt(&stored.ciphertext).unwrap().expose(), KEY);
	}

	#[tokio::test]
	async fn other_users_credential_is_denied_before_validation() {
		let f = fixture().await;
		let stranger = Caller::new(UserId::generate());

		let err = f
			.service
			.link(
				&stranger,
				OwnerKind::User,
				Some(f.user.into_inner()),
				&SecretString::from(KEY),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			CredentialError::AccessDenied(DenyReason::InsufficientPrivilege)
		));
		assert_eq!(f.validator.validate_calls.load(Ordering::SeqCst), 0);

		settle().await;
		assert_eq!(
			f.sink.event_types(),
			vec![AuditEventType::CredentialAccessDenied]
		);
	}

	#[tokio::test]
	async fn system_admin_can_manage_any_user() {
		let f = fixture().await;
		let admin = Caller::new(UserId::generate()).with_global_role(GlobalRole::SystemAdmin);

		f.service
			.link(
				&admin,
				OwnerKind::User,
				Some(f.user.into_inner()),
				&SecretString::from(KEY),
			)
			.await
			.unwrap();
		assert!(f
			.service
			.unlink(&admin, OwnerKind::User, Some(f.user.into_inner()))
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn manager_viewer_can_read_but_not_mutate() {
		let f = fixture().await;
		let viewer = Caller::new(UserId::generate()).with_grant(manager_grant(ManagerRole::Viewer));
		let owner = Some(f.manager.into_inner());

		let status = f
			.service
			.status(&viewer, OwnerKind::AllianceManager, owner)
			.await
			.unwrap();
		assert!(!status.is_linked);

		let err = f
			.service
			.link(&viewer, OwnerKind::AllianceManager, owner, &SecretString::from(KEY))
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			CredentialError::AccessDenied(DenyReason::ManagerAdminRequired)
		));
	}

	#[tokio::test]
	async fn manager_admin_can_link_manager_credential() {
		let f = fixture().await;
		let admin = Caller::new(UserId::generate()).with_grant(manager_grant(ManagerRole::Admin));
		let owner = Some(f.manager.into_inner());

		f.service
			.link(&admin, OwnerKind::AllianceManager, owner, &SecretString::from(KEY))
			.await
			.unwrap();
		let status = f
			.service
			.status(&admin, OwnerKind::AllianceManager, owner)
			.await
			.unwrap();
		assert!(status.is_linked);
		assert_eq!(status.alliance.unwrap().name, "Test Alliance");
	}

	#[tokio::test]
	async fn manager_kind_requires_owner_id() {
		let f = fixture().await;
		let err = f
			.service
			.status(&Caller::new(f.user), OwnerKind::AllianceManager, None)
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::MissingOwnerId));
	}

	#[tokio::test]
	async fn unknown_manager_is_hidden_from_non_admins() {
		let f = fixture().await;
		let missing = Some(Uuid::new_v4());

		let err = f
			.service
			.status(&Caller::new(f.user), OwnerKind::AllianceManager, missing)
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::AccessDenied(_)));

		let admin = Caller::new(f.user).with_global_role(GlobalRole::SystemAdmin);
		let err = f
			.service
			.status(&admin, OwnerKind::AllianceManager, missing)
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::OwnerNotFound));
	}

	#[tokio::test]
	async fn unlink_is_idempotent() {
		let f = fixture().await;
		let caller = Caller::new(f.user);

		f.service
			.link(&caller, OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap();
		assert!(f.service.unlink(&caller, OwnerKind::User, None).await.unwrap());
		assert!(!f.service.unlink(&caller, OwnerKind::User, None).await.unwrap());

		let status = f
			.service
			.status(&caller, OwnerKind::User, None)
			.await
			.unwrap();
		assert_eq!(status, CredentialStatus::unlinked());
	}

	#[tokio::test]
	async fn failed_usage_check_degrades_status() {
		let f = fixture_with(StubValidator::new().failing_usage()).await;
		let caller = Caller::new(f.user);

		f.service
			.link(&caller, OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap();
		let status = f
			.service
			.status(&caller, OwnerKind::User, None)
			.await
			.unwrap();
		assert!(status.is_linked);
		assert!(status.usage.is_none());
		assert!(status.error.unwrap().contains("usage check failed"));
	}

	#[tokio::test]
	async fn undecryptable_credential_is_a_decryption_error() {
		let f = fixture().await;
		let caller = Caller::new(f.user);

		f.service
			.link(&caller, OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap();

		let rotated = CredentialService::new(
			f.store.clone(),
			f.validator.clone(),
			Arc::new(CredentialCipher::new(SecretString::from("rotated-key"), 1_000)),
		);
		let err = rotated
			.status(&caller, OwnerKind::User, None)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			CredentialError::DecryptionError(CipherError::TagMismatch)
		));
	}

	#[tokio::test]
	async fn unconfigured_cipher_refuses_link_without_calling_upstream() {
		let f = fixture().await;
		let service = CredentialService::new(
			f.store.clone(),
			f.validator.clone(),
			Arc::new(CredentialCipher::unconfigured()),
		);

		let err = service
			.link(&Caller::new(f.user), OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			CredentialError::EncryptionUnavailable(CipherError::MasterKeyUnset)
		));
		assert_eq!(f.validator.validate_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn store_outage_blocks_link() {
		let f = fixture().await;
		f.store.set_unavailable(true);

		let err = f
			.service
			.link(&Caller::new(f.user), OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap_err();
		assert!(matches!(err, CredentialError::StoreUnavailable(_)));
	}

	#[tokio::test]
	async fn validate_does_not_store() {
		let f = fixture().await;
		let caller = Caller::new(f.user);

		let result = f
			.service
			.validate(&caller, &SecretString::from(KEY))
			.await
			.unwrap();
		assert_eq!(result.nation.name, "Testland");
		assert!(f
			.store
			.get(OwnerKind::User, f.user.into_inner())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn audit_details_never_contain_plaintext() {
		let f = fixture().await;
		let caller = Caller::new(f.user);

		f.service
			.link(&caller, OwnerKind::User, None, &SecretString::from(KEY))
			.await
			.unwrap();
		f.service.unlink(&caller, OwnerKind::User, None).await.unwrap();

		settle().await;
		for entry in f.sink.entries.lock().unwrap().iter() {
			assert!(!entry.details.to_string().contains(KEY));
		}
	}
}
