// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core event types for audit logging.
//!
//! - [`AuditEventType`]: every auditable credential event
//! - [`AuditSeverity`]: RFC 5424-compatible severity levels
//! - [`AuditLogEntry`]: a complete audit record
//! - [`AuditLogBuilder`]: fluent construction of entries
//!
//! Entries carry owner ids, masked views and nation ids. Never put a
//! plaintext key or ciphertext in `details`.

use chrono::{DateTime, Utc};
use pnw_server_auth::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	CredentialLinked,
	CredentialRelinked,
	CredentialUnlinked,
	CredentialValidated,
	CredentialAccessDenied,
	CredentialValidationFailed,
}

impl AuditEventType {
	pub fn default_severity(&self) -> AuditSeverity {
		match self {
			AuditEventType::CredentialValidated => AuditSeverity::Info,
			AuditEventType::CredentialLinked
			| AuditEventType::CredentialRelinked
			| AuditEventType::CredentialUnlinked => AuditSeverity::Notice,
			AuditEventType::CredentialAccessDenied | AuditEventType::CredentialValidationFailed => {
				AuditSeverity::Warning
			}
		}
	}
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditEventType::CredentialLinked => "credential_linked",
			AuditEventType::CredentialRelinked => "credential_relinked",
			AuditEventType::CredentialUnlinked => "credential_unlinked",
			AuditEventType::CredentialValidated => "credential_validated",
			AuditEventType::CredentialAccessDenied => "credential_access_denied",
			AuditEventType::CredentialValidationFailed => "credential_validation_failed",
		};
		write!(f, "{s}")
	}
}

/// Subset of RFC 5424 severities used by credential events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	#[default]
	Info = 6,
	Notice = 5,
	Warning = 4,
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
		};
		write!(f, "{s}")
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub event_type: AuditEventType,
	pub severity: AuditSeverity,
	pub actor_user_id: Option<UserId>,
	/// Owner kind, e.g. `user` or `alliance_manager`.
	pub resource_type: Option<String>,
	/// Owner record id.
	pub resource_id: Option<String>,
	pub action: String,
	pub details: serde_json::Value,
}

impl AuditLogEntry {
	pub fn builder(event_type: AuditEventType) -> AuditLogBuilder {
		AuditLogBuilder::new(event_type)
	}
}

pub struct AuditLogBuilder {
	event_type: AuditEventType,
	severity: Option<AuditSeverity>,
	actor_user_id: Option<UserId>,
	resource_type: Option<String>,
	resource_id: Option<String>,
	action: Option<String>,
	details: serde_json::Value,
}

impl AuditLogBuilder {
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			event_type,
			severity: None,
			actor_user_id: None,
			resource_type: None,
			resource_id: None,
			action: None,
			details: serde_json::Value::Null,
		}
	}

	/// Override the event type's default severity.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn actor(mut self, user_id: UserId) -> Self {
		self.actor_user_id = Some(user_id);
		self
	}

	pub fn resource(
		mut self,
		resource_type: impl Into<String>,
		resource_id: impl Into<String>,
	) -> Self {
		self.resource_type = Some(resource_type.into());
		self.resource_id = Some(resource_id.into());
		self
	}

	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			severity: self
				.severity
				.unwrap_or_else(|| self.event_type.default_severity()),
			actor_user_id: self.actor_user_id,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			action: self.action.unwrap_or_else(|| self.event_type.to_string()),
			details: self.details,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn display_returns_snake_case() {
		assert_eq!(
			AuditEventType::CredentialLinked.to_string(),
			"credential_linked"
		);
		assert_eq!(
			AuditEventType::CredentialAccessDenied.to_string(),
			"credential_access_denied"
		);
	}

	#[test]
	fn display_matches_serde() {
		for event_type in [
			AuditEventType::CredentialLinked,
			AuditEventType::CredentialRelinked,
			AuditEventType::CredentialUnlinked,
			AuditEventType::CredentialValidated,
			AuditEventType::CredentialAccessDenied,
			AuditEventType::CredentialValidationFailed,
		] {
			let json = serde_json::to_string(&event_type).unwrap();
			assert_eq!(json, format!("\"{event_type}\""));
		}
	}

	#[test]
	fn denials_default_to_warning() {
		assert_eq!(
			AuditEventType::CredentialAccessDenied.default_severity(),
			AuditSeverity::Warning
		);
		assert_eq!(
			AuditEventType::CredentialValidated.default_severity(),
			AuditSeverity::Info
		);
	}

	#[test]
	fn builder_fills_defaults() {
		let entry = AuditLogBuilder::new(AuditEventType::CredentialUnlinked).build();
		assert_eq!(entry.action, "credential_unlinked");
		assert_eq!(entry.severity, AuditSeverity::Notice);
		assert!(entry.actor_user_id.is_none());
		assert!(entry.details.is_null());
	}

	#[test]
	fn builder_sets_all_fields() {
		let actor = UserId::generate();
		let entry = AuditLogEntry::builder(AuditEventType::CredentialLinked)
			.actor(actor)
			.resource("user", actor.to_string())
			.action("linked game API key")
			.severity(AuditSeverity::Info)
			.details(json!({ "masked_view": "abcd********wxyz", "nation_id": 42 }))
			.build();

		assert_eq!(entry.actor_user_id, Some(actor));
		assert_eq!(entry.resource_type.as_deref(), Some("user"));
		assert_eq!(entry.resource_id, Some(actor.to_string()));
		assert_eq!(entry.action, "linked game API key");
		assert_eq!(entry.severity, AuditSeverity::Info);
		assert_eq!(entry.details["nation_id"], 42);
	}
}
