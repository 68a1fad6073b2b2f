// ABOUTME: Access and refresh token storage
// ABOUTME: Pair insertion, active lookups and conditional revocation for rotation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_uuid, Database, SqliteTransactionGuard};
use crate::errors::{AppError, AppResult};
use accounts_core::models::{OAuth2AccessToken, OAuth2RefreshToken};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Insert an access token inside a transaction
    ///
    /// # Errors
    /// Returns an error if the database write fails
    pub async fn insert_access_token(
        guard: &mut SqliteTransactionGuard<'_>,
        token: &OAuth2AccessToken,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth2_access_tokens (
                id, token_hash, client_id, user_id, scope, created_at, expires_at, revoked_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(token.id.to_string())
        .bind(&token.token_hash)
        .bind(&token.client_id)
        .bind(token.user_id.to_string())
        .bind(&token.scope)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to store access token: {e}")))?;

        Ok(())
    }

    /// Insert a refresh token inside a transaction
    ///
    /// # Errors
    /// Returns an error if the database write fails
    pub async fn insert_refresh_token(
        guard: &mut SqliteTransactionGuard<'_>,
        token: &OAuth2RefreshToken,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth2_refresh_tokens (
                id, token_hash, access_token_id, client_id, user_id, scope,
                created_at, expires_at, revoked_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(token.id.to_string())
        .bind(&token.token_hash)
        .bind(token.access_token_id.to_string())
        .bind(&token.client_id)
        .bind(token.user_id.to_string())
        .bind(&token.scope)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to store refresh token: {e}")))?;

        Ok(())
    }

    /// Fetch a non-revoked access token by digest
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_active_access_token(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<OAuth2AccessToken>> {
        let row = sqlx::query(
            r"
            SELECT id, token_hash, client_id, user_id, scope, created_at, expires_at, revoked_at
            FROM oauth2_access_tokens
            WHERE token_hash = $1 AND revoked_at IS NULL
            ",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get access token: {e}")))?;

        row.map(|r| Self::row_to_access_token(&r)).transpose()
    }

    /// Fetch a non-revoked refresh token issued to `client_id`
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_active_refresh_token(
        &self,
        token_hash: &str,
        client_id: &str,
    ) -> AppResult<Option<OAuth2RefreshToken>> {
        let row = sqlx::query(
            r"
            SELECT id, token_hash, access_token_id, client_id, user_id, scope,
                   created_at, expires_at, revoked_at
            FROM oauth2_refresh_tokens
            WHERE token_hash = $1 AND client_id = $2 AND revoked_at IS NULL
            ",
        )
        .bind(token_hash)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get refresh token: {e}")))?;

        row.map(|r| Self::row_to_refresh_token(&r)).transpose()
    }

    /// Revoke a refresh token if it is still active
    ///
    /// Returns `false` when a concurrent rotation already revoked it.
    ///
    /// # Errors
    /// Returns an error if the database update fails
    pub async fn revoke_refresh_token(
        guard: &mut SqliteTransactionGuard<'_>,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE oauth2_refresh_tokens SET revoked_at = $1 WHERE id = $2 AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(id.to_string())
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to revoke refresh token: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Revoke an access token if it is still active
    ///
    /// # Errors
    /// Returns an error if the database update fails
    pub async fn revoke_access_token(
        guard: &mut SqliteTransactionGuard<'_>,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE oauth2_access_tokens SET revoked_at = $1 WHERE id = $2 AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(id.to_string())
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to revoke access token: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    fn row_to_access_token(row: &SqliteRow) -> AppResult<OAuth2AccessToken> {
        Ok(OAuth2AccessToken {
            id: parse_uuid(row.get::<String, _>("id").as_str(), "access token id")?,
            token_hash: row.get("token_hash"),
            client_id: row.get("client_id"),
            user_id: parse_uuid(row.get::<String, _>("user_id").as_str(), "user_id")?,
            scope: row.get("scope"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
            revoked_at: row.get("revoked_at"),
        })
    }

    fn row_to_refresh_token(row: &SqliteRow) -> AppResult<OAuth2RefreshToken> {
        Ok(OAuth2RefreshToken {
            id: parse_uuid(row.get::<String, _>("id").as_str(), "refresh token id")?,
            token_hash: row.get("token_hash"),
            access_token_id: parse_uuid(
                row.get::<String, _>("access_token_id").as_str(),
                "access_token_id",
            )?,
            client_id: row.get("client_id"),
            user_id: parse_uuid(row.get::<String, _>("user_id").as_str(), "user_id")?,
            scope: row.get("scope"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
            revoked_at: row.get("revoked_at"),
        })
    }
}
