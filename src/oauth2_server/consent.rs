// ABOUTME: Consent store: standing per-(user, client) scope grants
// ABOUTME: Coverage checks decide whether authorization can skip the consent surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::scopes::ScopeSet;
use crate::database::Database;
use crate::errors::AppResult;
use accounts_core::models::OAuth2Consent;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Consent persistence and coverage logic
#[derive(Clone)]
pub struct ConsentStore {
    database: Arc<Database>,
}

impl ConsentStore {
    /// Creates a new consent store
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// The active consent for a user and client, if any
    ///
    /// # Errors
    /// Returns an error if the lookup fails
    pub async fn find_active(
        &self,
        user_id: Uuid,
        client_id: &str,
    ) -> AppResult<Option<OAuth2Consent>> {
        self.database.get_active_consent(user_id, client_id).await
    }

    /// Whether the consent already grants every requested scope
    #[must_use]
    pub fn covers(consent: &OAuth2Consent, requested: &ScopeSet) -> bool {
        consent.revoked_at.is_none() && requested.is_subset_of(&ScopeSet::parse(&consent.scope))
    }

    /// Record a grant of exactly `scopes`; last writer wins
    ///
    /// # Errors
    /// Returns an error if the write fails
    pub async fn upsert(&self, user_id: Uuid, client_id: &str, scopes: &ScopeSet) -> AppResult<()> {
        self.database
            .upsert_consent(user_id, client_id, &scopes.to_string(), Utc::now())
            .await?;
        info!(user_id = %user_id, client_id = %client_id, scope = %scopes, "Consent granted");
        Ok(())
    }

    /// Withdraw consent; returns whether an active consent existed
    ///
    /// # Errors
    /// Returns an error if the write fails
    pub async fn revoke(&self, user_id: Uuid, client_id: &str) -> AppResult<bool> {
        let revoked = self
            .database
            .revoke_consent(user_id, client_id, Utc::now())
            .await?;
        if revoked {
            info!(user_id = %user_id, client_id = %client_id, "Consent revoked");
        }
        Ok(revoked)
    }
}
