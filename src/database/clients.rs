// ABOUTME: OAuth 2.0 client registry storage
// ABOUTME: Provisioning, lookup, listing and activation of relying parties
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::Database;
use crate::errors::{AppError, AppResult};
use accounts_core::models::OAuth2Client;
use sqlx::sqlite::SqliteRow;
use sqlx::{Error as SqlxError, Row};

impl Database {
    /// Provision a new client
    ///
    /// # Errors
    /// Returns `ErrorCode::Conflict` if the `client_id` is taken, or a database error
    pub async fn create_oauth2_client(&self, client: &OAuth2Client) -> AppResult<()> {
        let redirect_uris = serde_json::to_string(&client.redirect_uris)?;
        let allowed_scopes = serde_json::to_string(&client.allowed_scopes)?;

        sqlx::query(
            r"
            INSERT INTO oauth2_clients (
                client_id, client_name, redirect_uris, allowed_scopes, is_active, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&client.client_id)
        .bind(&client.client_name)
        .bind(redirect_uris)
        .bind(allowed_scopes)
        .bind(client.is_active)
        .bind(client.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            SqlxError::Database(db) if db.is_unique_violation() => {
                AppError::already_exists(format!("OAuth2 client '{}'", client.client_id))
            }
            other => AppError::database(format!("Failed to create OAuth2 client: {other}")),
        })?;

        Ok(())
    }

    /// Look up a client regardless of its active flag
    ///
    /// # Errors
    /// Returns an error if the database query fails or the row is malformed
    pub async fn get_oauth2_client(&self, client_id: &str) -> AppResult<Option<OAuth2Client>> {
        let row = sqlx::query(
            r"
            SELECT client_id, client_name, redirect_uris, allowed_scopes, is_active, created_at
            FROM oauth2_clients
            WHERE client_id = $1
            ",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get OAuth2 client: {e}")))?;

        row.map(|r| Self::row_to_oauth2_client(&r)).transpose()
    }

    /// List all clients ordered by creation time
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn list_oauth2_clients(&self) -> AppResult<Vec<OAuth2Client>> {
        let rows = sqlx::query(
            r"
            SELECT client_id, client_name, redirect_uris, allowed_scopes, is_active, created_at
            FROM oauth2_clients
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list OAuth2 clients: {e}")))?;

        rows.iter().map(Self::row_to_oauth2_client).collect()
    }

    /// Activate or deactivate a client; returns whether a client matched
    ///
    /// # Errors
    /// Returns an error if the database update fails
    pub async fn set_oauth2_client_active(&self, client_id: &str, is_active: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE oauth2_clients SET is_active = $1 WHERE client_id = $2")
            .bind(is_active)
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update OAuth2 client: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_oauth2_client(row: &SqliteRow) -> AppResult<OAuth2Client> {
        let redirect_uris: String = row.get("redirect_uris");
        let allowed_scopes: String = row.get("allowed_scopes");

        Ok(OAuth2Client {
            client_id: row.get("client_id"),
            client_name: row.get("client_name"),
            redirect_uris: serde_json::from_str(&redirect_uris)?,
            allowed_scopes: serde_json::from_str(&allowed_scopes)?,
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
        })
    }
}
