// ABOUTME: Read access to the login collaborator's user table
// ABOUTME: Identity lookup for claims plus a development-only user insert
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use accounts_core::models::UserIdentity;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Error as SqlxError, Row};
use uuid::Uuid;

impl Database {
    /// Insert a user row; the login surface normally owns this table
    ///
    /// # Errors
    /// Returns `ErrorCode::Conflict` for a duplicate email, or a database error
    pub async fn create_user(&self, user: &UserIdentity, now: DateTime<Utc>) -> AppResult<()> {
        let email_confirmed_at = user.email_verified.then_some(now);

        sqlx::query(
            r"
            INSERT INTO users (id, email, email_confirmed_at, full_name, avatar_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(email_confirmed_at)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            SqlxError::Database(db) if db.is_unique_violation() => {
                AppError::already_exists(format!("User '{}'", user.email))
            }
            other => AppError::database(format!("Failed to create user: {other}")),
        })?;

        Ok(())
    }

    /// Look up identity claims for a user
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub async fn get_user_identity(&self, user_id: Uuid) -> AppResult<Option<UserIdentity>> {
        let row = sqlx::query(
            r"
            SELECT id, email, email_confirmed_at, full_name, avatar_url
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| Self::row_to_user_identity(&r)).transpose()
    }

    fn row_to_user_identity(row: &SqliteRow) -> AppResult<UserIdentity> {
        let email_confirmed_at: Option<DateTime<Utc>> = row.get("email_confirmed_at");

        Ok(UserIdentity {
            id: parse_uuid(row.get::<String, _>("id").as_str(), "user id")?,
            email: row.get("email"),
            email_verified: email_confirmed_at.is_some(),
            name: row.get("full_name"),
            avatar_url: row.get("avatar_url"),
        })
    }
}
