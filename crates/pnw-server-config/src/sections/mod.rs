// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for pnw-server.

pub mod audit;
pub mod credentials;
pub mod database;
pub mod game_api;
pub mod http;
pub mod logging;
pub mod rate_limit;

pub use audit::{AuditConfig, AuditConfigLayer, QueueOverflowPolicy};
pub use credentials::{CredentialsConfig, CredentialsConfigLayer, MIN_PBKDF2_ITERATIONS};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use game_api::{GameApiConfig, GameApiConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use rate_limit::{RateLimitConfig, RateLimitConfigLayer};
