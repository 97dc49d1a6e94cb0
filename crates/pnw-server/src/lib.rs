// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server for linking Politics & War API keys to dashboard accounts.

pub mod api;
pub mod auth_middleware;
pub mod error;
pub mod rate_limit;
pub mod routes;

pub use api::{create_router, AppState};
pub use error::{ErrorResponse, ServerError};
