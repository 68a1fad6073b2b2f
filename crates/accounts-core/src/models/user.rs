// ABOUTME: User identity record owned by the external login collaborator
// ABOUTME: Read-only to the authorization server; source of scope-filtered claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity claims for an end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user identifier
    pub id: Uuid,
    /// Primary email address
    pub email: String,
    /// Whether the email address has been confirmed
    pub email_verified: bool,
    /// Display name, when the user set one
    pub name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
}
