// ABOUTME: Bearer access token introspection
// ABOUTME: Pure read; reports active tokens with scope-filtered user claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::claims::resolve_claims;
use super::models::{IntrospectionResponse, OAuth2Error};
use super::scopes::ScopeSet;
use super::secrets::hash_secret;
use crate::database::Database;
use crate::identity::IdentityResolver;
use accounts_core::constants::oauth::TOKEN_TYPE_BEARER;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Validates access tokens presented by relying parties
#[derive(Clone)]
pub struct TokenIntrospector {
    database: Arc<Database>,
    identities: Arc<dyn IdentityResolver>,
}

impl TokenIntrospector {
    /// Creates a new introspector
    #[must_use]
    pub fn new(database: Arc<Database>, identities: Arc<dyn IdentityResolver>) -> Self {
        Self {
            database,
            identities,
        }
    }

    /// Describe an active access token
    ///
    /// # Errors
    /// Returns `invalid_token` (401) for a missing, unknown, revoked or
    /// expired token, or `server_error` if claims cannot be resolved
    pub async fn introspect(
        &self,
        bearer: Option<&str>,
    ) -> Result<IntrospectionResponse, OAuth2Error> {
        let Some(token) = bearer.filter(|t| !t.is_empty()) else {
            return Err(OAuth2Error::invalid_token(
                "Missing or invalid Authorization header",
            ));
        };

        let Some(record) = self
            .database
            .get_active_access_token(&hash_secret(token))
            .await?
        else {
            debug!("Introspected token not found or revoked");
            return Err(OAuth2Error::invalid_token("Token not found or revoked"));
        };

        if Utc::now() > record.expires_at {
            debug!(client_id = %record.client_id, "Introspected token has expired");
            return Err(OAuth2Error::invalid_token("Token has expired"));
        }

        let scope = ScopeSet::parse(&record.scope);
        let user = resolve_claims(self.identities.as_ref(), record.user_id, &scope).await?;

        Ok(IntrospectionResponse {
            active: true,
            scope: record.scope,
            client_id: record.client_id,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            exp: record.expires_at.timestamp(),
            iat: record.created_at.timestamp(),
            sub: record.user_id.to_string(),
            user,
        })
    }
}
