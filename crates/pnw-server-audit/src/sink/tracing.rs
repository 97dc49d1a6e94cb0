// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use super::{AuditSink, AuditSinkError};
use crate::event::{AuditLogEntry, AuditSeverity};

/// Emits each entry as a structured event on the `pnw_audit` target.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
	pub fn new() -> Self {
		Self
	}
}

pub fn severity_to_level(severity: AuditSeverity) -> Level {
	match severity {
		AuditSeverity::Info | AuditSeverity::Notice => Level::INFO,
		AuditSeverity::Warning => Level::WARN,
	}
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let event_type = entry.event_type.to_string();
		let id = entry.id.to_string();
		let actor_user_id = entry.actor_user_id.map(|u| u.to_string());
		let resource_type = entry.resource_type.as_deref();
		let resource_id = entry.resource_id.as_deref();
		let action = entry.action.as_str();
		let details = if entry.details.is_null() {
			None
		} else {
			Some(entry.details.to_string())
		};

		match severity_to_level(entry.severity) {
			Level::WARN => tracing::warn!(
				target: "pnw_audit",
				event_type,
				id,
				actor_user_id,
				resource_type,
				resource_id,
				details,
				"{action}"
			),
			_ => tracing::info!(
				target: "pnw_audit",
				event_type,
				id,
				actor_user_id,
				resource_type,
				resource_id,
				details,
				"{action}"
			),
		}

		Ok(())
	}
}
