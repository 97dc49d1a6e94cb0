// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;

use pnw_server_auth::{AllianceId, NationId};
use serde::{Deserialize, Serialize};

/// Usage above this percentage is reported as near the limit.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationIdentity {
	pub id: NationId,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceIdentity {
	pub id: AllianceId,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
	pub used: u64,
	pub max: u64,
	pub percentage_used: f64,
	pub is_near_limit: bool,
}

impl UsageSnapshot {
	pub fn new(used: u64, max: u64) -> Self {
		let percentage_used = if max == 0 {
			0.0
		} else {
			used as f64 / max as f64 * 100.0
		};
		Self {
			used,
			max,
			percentage_used,
			is_near_limit: percentage_used > NEAR_LIMIT_PERCENT,
		}
	}
}

/// Everything a successful validation learns about a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
	pub nation: NationIdentity,
	pub alliance: Option<AllianceIdentity>,
	/// Names of the permission flags the game reported as granted.
	pub capabilities: BTreeSet<String>,
	pub usage: UsageSnapshot,
}
