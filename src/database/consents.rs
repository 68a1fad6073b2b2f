// ABOUTME: Consent storage keyed by (user, client)
// ABOUTME: Active lookup, single-statement upsert and revocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use accounts_core::models::OAuth2Consent;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Get the active (non-revoked) consent for a user and client
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_active_consent(
        &self,
        user_id: Uuid,
        client_id: &str,
    ) -> AppResult<Option<OAuth2Consent>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, client_id, scope, granted_at, revoked_at
            FROM oauth2_consents
            WHERE user_id = $1 AND client_id = $2 AND revoked_at IS NULL
            ",
        )
        .bind(user_id.to_string())
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get consent: {e}")))?;

        row.map(|r| Self::row_to_consent(&r)).transpose()
    }

    /// Record a grant, replacing the scope of an existing active consent
    ///
    /// A single statement against the partial unique index on active
    /// consents, so concurrent grants for the same pair resolve to one row.
    ///
    /// # Errors
    /// Returns an error if the database write fails
    pub async fn upsert_consent(
        &self,
        user_id: Uuid,
        client_id: &str,
        scope: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth2_consents (id, user_id, client_id, scope, granted_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, NULL)
            ON CONFLICT (user_id, client_id) WHERE revoked_at IS NULL
            DO UPDATE SET scope = excluded.scope, granted_at = excluded.granted_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(client_id)
        .bind(scope)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert consent: {e}")))?;

        Ok(())
    }

    /// Withdraw the active consent; returns whether one was revoked
    ///
    /// # Errors
    /// Returns an error if the database update fails
    pub async fn revoke_consent(
        &self,
        user_id: Uuid,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE oauth2_consents
            SET revoked_at = $1
            WHERE user_id = $2 AND client_id = $3 AND revoked_at IS NULL
            ",
        )
        .bind(now)
        .bind(user_id.to_string())
        .bind(client_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to revoke consent: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_consent(row: &SqliteRow) -> AppResult<OAuth2Consent> {
        Ok(OAuth2Consent {
            id: parse_uuid(row.get::<String, _>("id").as_str(), "consent id")?,
            user_id: parse_uuid(row.get::<String, _>("user_id").as_str(), "user_id")?,
            client_id: row.get("client_id"),
            scope: row.get("scope"),
            granted_at: row.get("granted_at"),
            revoked_at: row.get("revoked_at"),
        })
    }
}
