// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for callers and credential owners.
//!
//! Dashboard records ([`UserId`], [`ManagerId`]) are UUIDs. Game entities
//! ([`NationId`], [`AllianceId`]) are the integer ids the game API reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			pub fn into_inner(self) -> Uuid {
				self.0
			}

			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl std::str::FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a dashboard user.");
define_id_type!(
	ManagerId,
	"Unique identifier for an alliance-manager record."
);

macro_rules! define_game_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(i64);

		impl $name {
			pub fn new(id: i64) -> Self {
				Self(id)
			}

			pub fn get(self) -> i64 {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}
	};
}

define_game_id_type!(NationId, "Nation id as reported by the game API.");
define_game_id_type!(AllianceId, "Alliance id as reported by the game API.");

// =============================================================================
// Roles
// =============================================================================

/// System-wide roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
	/// Full access to every credential.
	SystemAdmin,
}

impl fmt::Display for GlobalRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GlobalRole::SystemAdmin => write!(f, "system_admin"),
		}
	}
}

/// Role held by a user on an alliance-manager grant.
///
/// Ordered: `Viewer < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerRole {
	Viewer,
	Admin,
}

impl ManagerRole {
	/// Admin role is required to link or unlink an alliance credential.
	pub fn can_mutate(self) -> bool {
		self >= ManagerRole::Admin
	}
}

impl fmt::Display for ManagerRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ManagerRole::Viewer => write!(f, "viewer"),
			ManagerRole::Admin => write!(f, "admin"),
		}
	}
}

impl std::str::FromStr for ManagerRole {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"viewer" => Ok(ManagerRole::Viewer),
			"admin" => Ok(ManagerRole::Admin),
			other => Err(format!("unknown manager role: {other}")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_id_serializes_as_plain_uuid() {
		let id = UserId::generate();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{}\"", id.into_inner()));
	}

	#[test]
	fn user_id_parses_from_str() {
		let uuid = Uuid::new_v4();
		let parsed: UserId = uuid.to_string().parse().unwrap();
		assert_eq!(parsed.into_inner(), uuid);
		assert!("not-a-uuid".parse::<UserId>().is_err());
	}

	#[test]
	fn alliance_id_is_transparent_integer() {
		assert_eq!(serde_json::to_string(&AllianceId::new(7)).unwrap(), "7");
	}

	#[test]
	fn manager_role_ordering() {
		assert!(ManagerRole::Viewer < ManagerRole::Admin);
		assert!(ManagerRole::Admin.can_mutate());
		assert!(!ManagerRole::Viewer.can_mutate());
	}

	#[test]
	fn manager_role_round_trips_through_display() {
		for role in [ManagerRole::Viewer, ManagerRole::Admin] {
			assert_eq!(role.to_string().parse::<ManagerRole>().unwrap(), role);
		}
		assert!("owner".parse::<ManagerRole>().is_err());
	}
}
