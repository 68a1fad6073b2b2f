// ABOUTME: Client registry lookups and request validation
// ABOUTME: Active check, exact redirect membership and scope allowance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::models::OAuth2Error;
use super::scopes::ScopeSet;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use accounts_core::models::OAuth2Client;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Read side of the client registry plus out-of-band provisioning
#[derive(Clone)]
pub struct ClientRegistry {
    database: Arc<Database>,
}

impl ClientRegistry {
    /// Creates a new client registry
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Look up a client regardless of its active flag
    ///
    /// # Errors
    /// Returns `ErrorCode::NotFound` for an unknown client, or a database error
    pub async fn resolve(&self, client_id: &str) -> AppResult<OAuth2Client> {
        self.database
            .get_oauth2_client(client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("OAuth2 client '{client_id}'")))
    }

    /// Look up a client that is allowed to take part in flows
    ///
    /// # Errors
    /// Returns `invalid_client` (401) for unknown or inactive clients
    pub async fn resolve_active(&self, client_id: &str) -> Result<OAuth2Client, OAuth2Error> {
        match self.database.get_oauth2_client(client_id).await? {
            Some(client) if client.is_active => {
                debug!(client_id = %client_id, "Resolved active OAuth2 client");
                Ok(client)
            }
            Some(_) => {
                warn!(client_id = %client_id, "Rejected inactive OAuth2 client");
                Err(OAuth2Error::invalid_client())
            }
            None => {
                warn!(client_id = %client_id, "Rejected unknown OAuth2 client");
                Err(OAuth2Error::invalid_client())
            }
        }
    }

    /// Exact string membership of `redirect_uri` in the client's registered set
    ///
    /// # Errors
    /// Returns `invalid_request` when the redirect is not registered
    pub fn validate_redirect_uri(
        client: &OAuth2Client,
        redirect_uri: &str,
    ) -> Result<(), OAuth2Error> {
        if client.has_redirect_uri(redirect_uri) {
            Ok(())
        } else {
            warn!(client_id = %client.client_id, "Rejected unregistered redirect_uri");
            Err(OAuth2Error::invalid_request("Invalid redirect_uri"))
        }
    }

    /// Requested scopes must be a subset of the client's allowed scopes
    ///
    /// # Errors
    /// Returns `invalid_scope` naming every disallowed scope
    pub fn validate_scopes(client: &OAuth2Client, requested: &ScopeSet) -> Result<(), OAuth2Error> {
        let rejected = requested.rejected_by(|scope| client.allows_scope(scope));
        if rejected.is_empty() {
            Ok(())
        } else {
            Err(OAuth2Error::invalid_scope(&format!(
                "Invalid scopes: {}",
                rejected.join(", ")
            )))
        }
    }

    /// Validate redirect, then scopes, for a resolved client
    ///
    /// The redirect is checked first, so an `invalid_scope` result means the
    /// redirect is registered and may carry the error back.
    ///
    /// # Errors
    /// Returns `invalid_request` or `invalid_scope`
    pub fn validate(
        client: &OAuth2Client,
        redirect_uri: &str,
        requested: &ScopeSet,
    ) -> Result<(), OAuth2Error> {
        Self::validate_redirect_uri(client, redirect_uri)?;
        Self::validate_scopes(client, requested)
    }

    /// Provision a new client
    ///
    /// # Errors
    /// Returns `InvalidInput` for malformed registrations, or a storage error
    pub async fn register(
        &self,
        client_id: &str,
        client_name: &str,
        redirect_uris: Vec<String>,
        allowed_scopes: &ScopeSet,
    ) -> AppResult<OAuth2Client> {
        if client_id.trim().is_empty() {
            return Err(AppError::invalid_input("client_id must not be empty"));
        }
        if redirect_uris.is_empty() {
            return Err(AppError::invalid_input(
                "At least one redirect_uri is required",
            ));
        }
        for uri in &redirect_uris {
            if !Self::is_valid_redirect_uri(uri) {
                return Err(AppError::invalid_input(format!("Invalid redirect_uri: {uri}")));
            }
        }
        if allowed_scopes.is_empty() {
            return Err(AppError::invalid_input("At least one scope is required"));
        }

        let client = OAuth2Client {
            client_id: client_id.to_owned(),
            client_name: client_name.to_owned(),
            redirect_uris,
            allowed_scopes: allowed_scopes.iter().map(str::to_owned).collect(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.database.create_oauth2_client(&client).await?;

        info!(client_id = %client.client_id, "Registered OAuth2 client");
        Ok(client)
    }

    /// Absolute URI without a fragment (RFC 6749 Section 3.1.2)
    fn is_valid_redirect_uri(uri: &str) -> bool {
        Url::parse(uri).is_ok_and(|url| url.fragment().is_none() && !url.cannot_be_a_base())
    }
}
