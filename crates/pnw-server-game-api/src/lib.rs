// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Politics & War API key validation.
//!
//! [`GameApiValidator`] checks a key against the game's GraphQL endpoint and
//! reports the nation, alliance, permission flags and request usage the key
//! carries. The HTTP call sits behind [`GameApiTransport`] so tests can stub
//! it; [`ReqwestTransport`] is the production implementation.
//!
//! Nothing here retries. A failed call is reported once and the caller
//! decides what to do.

pub mod error;
pub mod transport;
pub mod types;
pub mod validator;

pub use error::{GameApiError, TransportError};
pub use transport::{GameApiTransport, ReqwestTransport, TransportResponse};
pub use types::{AllianceIdentity, NationIdentity, UsageSnapshot, ValidationResult};
pub use validator::{GameApiValidator, KeyValidator, MIN_KEY_LENGTH};
