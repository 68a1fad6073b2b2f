// ABOUTME: Scope-filtered user claims returned by code exchange and introspection
// ABOUTME: Fields appear only when the granted scope allows them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::models::OAuth2Error;
use super::scopes::ScopeSet;
use crate::identity::IdentityResolver;
use accounts_core::constants::scopes::{EMAIL, PROFILE};
use accounts_core::models::UserIdentity;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

/// User object embedded in token and introspection responses
///
/// `id` and `email_verified` are always present. `email` requires the
/// `email` scope; `name` and `avatar_url` require `profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// User identifier
    pub id: Uuid,
    /// Whether the email address has been confirmed
    pub email_verified: bool,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserClaims {
    /// Project an identity through the granted scope
    #[must_use]
    pub fn filtered(identity: &UserIdentity, scope: &ScopeSet) -> Self {
        let profile = scope.contains(PROFILE);
        Self {
            id: identity.id,
            email_verified: identity.email_verified,
            email: scope.contains(EMAIL).then(|| identity.email.clone()),
            name: profile.then(|| identity.name.clone()).flatten(),
            avatar_url: profile.then(|| identity.avatar_url.clone()).flatten(),
        }
    }
}

/// Resolve a token subject through the identity collaborator and filter by scope
///
/// # Errors
/// Returns `server_error` when the collaborator fails or does not know the user
pub async fn resolve_claims(
    identities: &dyn IdentityResolver,
    user_id: Uuid,
    scope: &ScopeSet,
) -> Result<UserClaims, OAuth2Error> {
    match identities.resolve_identity(user_id).await? {
        Some(identity) => Ok(UserClaims::filtered(&identity, scope)),
        None => {
            error!(user_id = %user_id, "Identity collaborator has no record for token subject");
            Err(OAuth2Error::server_error("Failed to get user info"))
        }
    }
}
