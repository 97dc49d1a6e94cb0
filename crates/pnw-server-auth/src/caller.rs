// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated caller, resolved once per request.
//!
//! All attributes are loaded before any policy evaluation, so [`crate::authorize`]
//! never touches the database.

use crate::types::{AllianceId, GlobalRole, ManagerId, ManagerRole, UserId};
use serde::{Deserialize, Serialize};

/// One `alliance_managers` row held by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerGrant {
	pub manager_id: ManagerId,
	pub alliance_id: AllianceId,
	pub role: ManagerRole,
	pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
	pub user_id: UserId,
	pub global_roles: Vec<GlobalRole>,
	pub manager_grants: Vec<ManagerGrant>,
}

impl Caller {
	/// A caller with no roles or grants.
	pub fn new(user_id: UserId) -> Self {
		Self {
			user_id,
			global_roles: Vec::new(),
			manager_grants: Vec::new(),
		}
	}

	pub fn with_global_role(mut self, role: GlobalRole) -> Self {
		if !self.global_roles.contains(&role) {
			self.global_roles.push(role);
		}
		self
	}

	pub fn with_grant(mut self, grant: ManagerGrant) -> Self {
		self.manager_grants.push(grant);
		self
	}

	pub fn is_system_admin(&self) -> bool {
		self.global_roles.contains(&GlobalRole::SystemAdmin)
	}

	/// Highest role among the caller's active grants for `alliance_id`.
	pub fn manager_role_for(&self, alliance_id: AllianceId) -> Option<ManagerRole> {
		self
			.manager_grants
			.iter()
			.filter(|g| g.is_active && g.alliance_id == alliance_id)
			.map(|g| g.role)
			.max()
	}
}
