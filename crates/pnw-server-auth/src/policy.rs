// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential access policy.
//!
//! [`authorize`] evaluates tiers in order and returns on the first match:
//!
//! 1. **System admin**: any action on any owner
//! 2. **Self**: a user acting on their own credential
//! 3. **Alliance manager**: an active grant on the owner's alliance; `Link`
//!    and `Unlink` additionally need [`ManagerRole::Admin`]
//!
//! Anything else is denied. The function is pure: every attribute it reads is
//! already on the [`Caller`] or the [`CredentialOwner`].

use crate::caller::Caller;
use crate::types::{AllianceId, ManagerId, ManagerRole, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Which table a credential lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
	User,
	AllianceManager,
}

impl OwnerKind {
	pub fn as_str(self) -> &'static str {
		match self {
			OwnerKind::User => "user",
			OwnerKind::AllianceManager => "alliance_manager",
		}
	}
}

impl fmt::Display for OwnerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The owner of a credential, with the attributes the policy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOwner {
	User(UserId),
	AllianceManager {
		manager_id: ManagerId,
		alliance_id: AllianceId,
	},
}

impl CredentialOwner {
	pub fn kind(&self) -> OwnerKind {
		match self {
			CredentialOwner::User(_) => OwnerKind::User,
			CredentialOwner::AllianceManager { .. } => OwnerKind::AllianceManager,
		}
	}

	/// The owning record's UUID as a string, for storage keys and audit.
	pub fn id_string(&self) -> String {
		match self {
			CredentialOwner::User(id) => id.to_string(),
			CredentialOwner::AllianceManager { manager_id, .. } => manager_id.to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	ViewStatus,
	Link,
	Unlink,
}

impl Action {
	pub fn is_mutating(self) -> bool {
		matches!(self, Action::Link | Action::Unlink)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
	/// No tier matched.
	InsufficientPrivilege,
	/// The caller manages the alliance but only as a viewer.
	ManagerAdminRequired,
}

impl fmt::Display for DenyReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DenyReason::InsufficientPrivilege => write!(f, "insufficient privilege"),
			DenyReason::ManagerAdminRequired => {
				write!(f, "insufficient privilege: alliance admin role required")
			}
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
	Allow,
	Deny(DenyReason),
}

impl AccessDecision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, AccessDecision::Allow)
	}
}

/// Decide whether `caller` may perform `action` on `owner`'s credential.
#[instrument(
	level = "debug",
	skip(caller, owner),
	fields(
		user_id = %caller.user_id,
		owner_kind = %owner.kind(),
		action = ?action,
	),
	ret
)]
pub fn authorize(caller: &Caller, owner: &CredentialOwner, action: Action) -> AccessDecision {
	if caller.is_system_admin() {
		return AccessDecision::Allow;
	}

	match owner {
		CredentialOwner::User(user_id) if *user_id == caller.user_id => AccessDecision::Allow,
		CredentialOwner::User(_) => AccessDecision::Deny(DenyReason::InsufficientPrivilege),
		CredentialOwner::AllianceManager { alliance_id, .. } => {
			evaluate_alliance(caller, *alliance_id, action)
		}
	}
}

fn evaluate_alliance(caller: &Caller, alliance_id: AllianceId, action: Action) -> AccessDecision {
	match caller.manager_role_for(alliance_id) {
		None => AccessDecision::Deny(DenyReason::InsufficientPrivilege),
		Some(role) if action.is_mutating() && !role.can_mutate() => {
			AccessDecision::Deny(DenyReason::ManagerAdminRequired)
		}
		Some(ManagerRole::Viewer) | Some(ManagerRole::Admin) => AccessDecision::Allow,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::caller::ManagerGrant;
	use crate::types::GlobalRole;
	use proptest::prelude::*;

	const ALL_ACTIONS: [Action; 3] = [Action::ViewStatus, Action::Link, Action::Unlink];

	fn alliance_owner(alliance: i64) -> CredentialOwner {
		CredentialOwner::AllianceManager {
			manager_id: ManagerId::generate(),
			alliance_id: AllianceId::new(alliance),
		}
	}

	fn manager(alliance: i64, role: ManagerRole, is_active: bool) -> Caller {
		Caller::new(UserId::generate()).with_grant(ManagerGrant {
			manager_id: ManagerId::generate(),
			alliance_id: AllianceId::new(alliance),
			role,
			is_active,
		})
	}

	mod system_admin {
		use super::*;

		#[test]
		fn allowed_on_any_user() {
			let admin = Caller::new(UserId::generate()).with_global_role(GlobalRole::SystemAdmin);
			let owner = CredentialOwner::User(UserId::generate());
			for action in ALL_ACTIONS {
				assert!(authorize(&admin, &owner, action).is_allowed());
			}
		}

		#[test]
		fn allowed_on_any_alliance() {
			let admin = Caller::new(UserId::generate()).with_global_role(GlobalRole::SystemAdmin);
			for action in ALL_ACTIONS {
				assert!(authorize(&admin, &alliance_owner(99), action).is_allowed());
			}
		}
	}

	mod self_access {
		use super::*;

		#[test]
		fn user_may_manage_own_credential() {
			let user_id = UserId::generate();
			let caller = Caller::new(user_id);
			let owner = CredentialOwner::User(user_id);
			for action in ALL_ACTIONS {
				assert_eq!(authorize(&caller, &owner, action), AccessDecision::Allow);
			}
		}

		#[test]
		fn user_may_not_touch_other_user() {
			let caller = Caller::new(UserId::generate());
			let owner = CredentialOwner::User(UserId::generate());
			for action in ALL_ACTIONS {
				assert_eq!(
					authorize(&caller, &owner, action),
					AccessDecision::Deny(DenyReason::InsufficientPrivilege)
				);
			}
		}

		#[test]
		fn manager_grant_does_not_reach_user_credentials() {
			let caller = manager(1, ManagerRole::Admin, true);
			let owner = CredentialOwner::User(UserId::generate());
			assert!(!authorize(&caller, &owner, Action::ViewStatus).is_allowed());
		}
	}

	mod alliance_manager {
		use super::*;

		#[test]
		fn admin_may_link_and_unlink() {
			let caller = manager(5, ManagerRole::Admin, true);
			for action in ALL_ACTIONS {
				assert!(authorize(&caller, &alliance_owner(5), action).is_allowed());
			}
		}

		#[test]
		fn viewer_may_only_view() {
			let caller = manager(5, ManagerRole::Viewer, true);
			let owner = alliance_owner(5);
			assert!(authorize(&caller, &owner, Action::ViewStatus).is_allowed());
			assert_eq!(
				authorize(&caller, &owner, Action::Link),
				AccessDecision::Deny(DenyReason::ManagerAdminRequired)
			);
			assert_eq!(
				authorize(&caller, &owner, Action::Unlink),
				AccessDecision::Deny(DenyReason::ManagerAdminRequired)
			);
		}

		#[test]
		fn inactive_grant_is_denied() {
			let caller = manager(5, ManagerRole::Admin, false);
			for action in ALL_ACTIONS {
				assert_eq!(
					authorize(&caller, &alliance_owner(5), action),
					AccessDecision::Deny(DenyReason::InsufficientPrivilege)
				);
			}
		}

		#[test]
		fn other_alliance_is_denied() {
			let caller = manager(5, ManagerRole::Admin, true);
			assert!(!authorize(&caller, &alliance_owner(6), Action::ViewStatus).is_allowed());
		}
	}

	#[test]
	fn deny_reason_messages() {
		assert_eq!(
			DenyReason::InsufficientPrivilege.to_string(),
			"insufficient privilege"
		);
		assert!(DenyReason::ManagerAdminRequired
			.to_string()
			.starts_with("insufficient privilege"));
	}

	#[test]
	fn owner_kind_serializes_snake_case() {
		assert_eq!(
			serde_json::to_string(&OwnerKind::AllianceManager).unwrap(),
			"\"alliance_manager\""
		);
	}

	proptest! {
		#[test]
		fn no_grant_no_admin_never_allowed_on_foreign_owner(alliance in 1i64..10_000, action_idx in 0usize..3) {
			let caller = Caller::new(UserId::generate());
			let action = ALL_ACTIONS[action_idx];
			prop_assert!(!authorize(&caller, &alliance_owner(alliance), action).is_allowed());
			prop_assert!(!authorize(&caller, &CredentialOwner::User(UserId::generate()), action).is_allowed());
		}
	}
}
