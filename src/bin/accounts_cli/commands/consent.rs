// ABOUTME: Consent management commands for the accounts CLI
// ABOUTME: Revokes a user's active consent so the next authorization prompts again
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use alsamos_accounts::{database::Database, errors::AppResult, oauth2_server::ConsentStore};
use std::sync::Arc;
use uuid::Uuid;

/// Revoke the active consent for (user, client)
pub async fn revoke(database: Database, user_id: Uuid, client_id: &str) -> AppResult<()> {
    let consents = ConsentStore::new(Arc::new(database));
    if consents.revoke(user_id, client_id).await? {
        println!("Consent revoked for user {user_id} on client '{client_id}'");
    } else {
        println!("No active consent for user {user_id} on client '{client_id}'");
    }
    Ok(())
}
