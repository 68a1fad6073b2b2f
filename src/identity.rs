// ABOUTME: Boundary to the login collaborator that owns user identities
// ABOUTME: IdentityResolver trait with the SQLite-backed implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::database::Database;
use crate::errors::AppResult;
use accounts_core::models::UserIdentity;
use async_trait::async_trait;
use uuid::Uuid;

/// Resolves user identity claims from the login collaborator
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Look up a user; `None` when the collaborator does not know the id
    ///
    /// # Errors
    /// Returns an error when the collaborator cannot be reached
    async fn resolve_identity(&self, user_id: Uuid) -> AppResult<Option<UserIdentity>>;
}

#[async_trait]
impl IdentityResolver for Database {
    async fn resolve_identity(&self, user_id: Uuid) -> AppResult<Option<UserIdentity>> {
        self.get_user_identity(user_id).await
    }
}
