// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite access for the PnW dashboard server.
//!
//! Credential columns are owned by `pnw-server-credentials`; this crate holds
//! the pool, the schema, and the repositories for sessions, rate limits and
//! audit reads.

pub mod audit;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod rate_limit;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use audit::{AuditLogRepository, AuditLogRow};
pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::{create_pool, ping};
pub use rate_limit::{sliding_estimate, RateLimitHit, RateLimitRepository, RateLimitStore};
pub use session::{SessionRepository, SessionStore};
