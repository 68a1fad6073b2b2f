// ABOUTME: Client management commands for the accounts CLI
// ABOUTME: Handles register, activate, deactivate and list operations for relying parties
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use alsamos_accounts::{
    database::Database,
    errors::{AppError, AppResult},
    oauth2_server::{ClientRegistry, ScopeSet},
};
use std::sync::Arc;
use tracing::info;

use crate::helpers::display::{display_client, display_client_table};

/// Register a new client
pub async fn register(
    database: Database,
    client_id: &str,
    name: &str,
    redirect_uris: Vec<String>,
    scope: &str,
) -> AppResult<()> {
    let registry = ClientRegistry::new(Arc::new(database));
    let client = registry
        .register(client_id, name, redirect_uris, &ScopeSet::parse(scope))
        .await?;

    println!("Client registered successfully");
    display_client(&client);
    Ok(())
}

/// Flip a client's active flag
pub async fn set_active(database: &Database, client_id: &str, is_active: bool) -> AppResult<()> {
    if !database.set_oauth2_client_active(client_id, is_active).await? {
        return Err(AppError::not_found(format!("OAuth2 client '{client_id}'")));
    }

    info!(client_id = %client_id, is_active, "Client active flag updated");
    println!(
        "Client '{client_id}' {}",
        if is_active { "activated" } else { "deactivated" }
    );
    Ok(())
}

/// List all clients
pub async fn list(database: &Database) -> AppResult<()> {
    let clients = database.list_oauth2_clients().await?;
    if clients.is_empty() {
        println!("No clients registered");
        return Ok(());
    }
    display_client_table(&clients);
    Ok(())
}
