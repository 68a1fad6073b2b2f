// ABOUTME: Authorization code storage with single-use consumption
// ABOUTME: Codes are never deleted; consumption is a conditional write on used_at
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_uuid, Database, SqliteTransactionGuard};
use crate::errors::{AppError, AppResult};
use accounts_core::models::OAuth2AuthorizationCode;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Persist a freshly issued authorization code
    ///
    /// # Errors
    /// Returns an error if the database write fails
    pub async fn store_authorization_code(&self, code: &OAuth2AuthorizationCode) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth2_authorization_codes (
                code_hash, client_id, user_id, redirect_uri, scope,
                code_challenge, code_challenge_method, created_at, expires_at, used_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(&code.code_hash)
        .bind(&code.client_id)
        .bind(code.user_id.to_string())
        .bind(&code.redirect_uri)
        .bind(&code.scope)
        .bind(&code.code_challenge)
        .bind(&code.code_challenge_method)
        .bind(code.created_at)
        .bind(code.expires_at)
        .bind(code.used_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store authorization code: {e}")))?;

        Ok(())
    }

    /// Fetch a code that has not been consumed yet
    ///
    /// Expiry is not filtered here; callers compare `expires_at` so they can
    /// report an expired code distinctly.
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_unused_authorization_code(
        &self,
        code_hash: &str,
        client_id: &str,
    ) -> AppResult<Option<OAuth2AuthorizationCode>> {
        let row = sqlx::query(
            r"
            SELECT code_hash, client_id, user_id, redirect_uri, scope, code_challenge,
                   code_challenge_method, created_at, expires_at, used_at
            FROM oauth2_authorization_codes
            WHERE code_hash = $1 AND client_id = $2 AND used_at IS NULL
            ",
        )
        .bind(code_hash)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get authorization code: {e}")))?;

        row.map(|r| Self::row_to_authorization_code(&r)).transpose()
    }

    /// Mark a code used if and only if nobody else has
    ///
    /// Returns `false` when zero rows matched, meaning a concurrent exchange
    /// already consumed the code.
    ///
    /// # Errors
    /// Returns an error if the database update fails
    pub async fn mark_authorization_code_used(
        guard: &mut SqliteTransactionGuard<'_>,
        code_hash: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE oauth2_authorization_codes
            SET used_at = $1
            WHERE code_hash = $2 AND client_id = $3 AND used_at IS NULL
            ",
        )
        .bind(now)
        .bind(code_hash)
        .bind(client_id)
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to consume authorization code: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    fn row_to_authorization_code(row: &SqliteRow) -> AppResult<OAuth2AuthorizationCode> {
        Ok(OAuth2AuthorizationCode {
            code_hash: row.get("code_hash"),
            client_id: row.get("client_id"),
            user_id: parse_uuid(row.get::<String, _>("user_id").as_str(), "user_id")?,
            redirect_uri: row.get("redirect_uri"),
            scope: row.get("scope"),
            code_challenge: row.get("code_challenge"),
            code_challenge_method: row.get("code_challenge_method"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
            used_at: row.get("used_at"),
        })
    }
}
