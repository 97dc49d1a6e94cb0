// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller identity and access policy for linked game credentials.
//!
//! - [`types`]: ID newtypes and role enums
//! - [`caller`]: the pre-resolved [`Caller`] snapshot handed to every operation
//! - [`policy`]: the pure [`authorize`] decision function
//! - [`token`]: bearer token extraction and hashing

pub mod caller;
pub mod policy;
pub mod token;
pub mod types;

pub use caller::{Caller, ManagerGrant};
pub use policy::{authorize, AccessDecision, Action, CredentialOwner, DenyReason, OwnerKind};
pub use token::{extract_bearer_token, hash_token};
pub use types::{AllianceId, GlobalRole, ManagerId, ManagerRole, NationId, UserId};
