// ABOUTME: SQLite persistence for the authorization server
// ABOUTME: Connection pool setup, schema migrations and transaction entry point
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! All mutable protocol state lives here: registered clients, consents,
//! authorization codes and token pairs. Operations that must be atomic
//! (code consumption, refresh rotation) run as conditional writes inside a
//! [`SqliteTransactionGuard`].

mod authorization_codes;
mod clients;
mod consents;
mod tokens;
/// RAII transaction guard
pub mod transactions;
mod users;

use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;
pub use transactions::SqliteTransactionGuard;

/// Connections kept by a file-backed pool
const MAX_FILE_CONNECTIONS: u32 = 8;

/// How long a writer waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database manager for OAuth 2.0 server storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the database and run migrations
    ///
    /// In-memory databases use a single long-lived connection so every
    /// caller sees the same schema and rows.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid, the connection fails, or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:");

        let mut connect_options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !in_memory {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_FILE_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        info!(in_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Begin a transaction wrapped in a rollback-on-drop guard
    ///
    /// While the guard is alive, queries must go through
    /// [`SqliteTransactionGuard::executor`]; an in-memory pool has only one
    /// connection and the guard holds it.
    ///
    /// # Errors
    /// Returns an error if a connection cannot be acquired
    pub async fn begin(&self) -> AppResult<SqliteTransactionGuard<'static>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        Ok(SqliteTransactionGuard::new(tx))
    }

    /// Cheap connectivity check used by the readiness probe
    ///
    /// # Errors
    /// Returns an error if the database does not answer
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// # Errors
    /// Returns an error if any schema statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_oauth2_clients().await?;
        self.migrate_oauth2_consents().await?;
        self.migrate_oauth2_authorization_codes().await?;
        self.migrate_oauth2_tokens().await?;
        debug!("Database migrations complete");
        Ok(())
    }

    async fn execute_schema(&self, statement: &str) -> AppResult<()> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    async fn migrate_users(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                email_confirmed_at DATETIME,
                full_name TEXT,
                avatar_url TEXT,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .await
    }

    async fn migrate_oauth2_clients(&self) -> AppResult<()> {
        // redirect_uris and allowed_scopes are JSON arrays
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_clients (
                client_id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                redirect_uris TEXT NOT NULL,
                allowed_scopes TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .await
    }

    async fn migrate_oauth2_consents(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_consents (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                client_id TEXT NOT NULL REFERENCES oauth2_clients(client_id) ON DELETE CASCADE,
                scope TEXT NOT NULL,
                granted_at DATETIME NOT NULL,
                revoked_at DATETIME
            )
            ",
        )
        .await?;

        // At most one active consent per (user, client)
        self.execute_schema(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_oauth2_consents_active
            ON oauth2_consents(user_id, client_id)
            WHERE revoked_at IS NULL
            ",
        )
        .await
    }

    async fn migrate_oauth2_authorization_codes(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_authorization_codes (
                code_hash TEXT PRIMARY KEY,
                client_id TEXT NOT NULL REFERENCES oauth2_clients(client_id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                scope TEXT NOT NULL,
                code_challenge TEXT,
                code_challenge_method TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                used_at DATETIME
            )
            ",
        )
        .await
    }

    async fn migrate_oauth2_tokens(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_access_tokens (
                id TEXT PRIMARY KEY,
                token_hash TEXT NOT NULL UNIQUE,
                client_id TEXT NOT NULL REFERENCES oauth2_clients(client_id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                revoked_at DATETIME
            )
            ",
        )
        .await?;

        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_refresh_tokens (
                id TEXT PRIMARY KEY,
                token_hash TEXT NOT NULL UNIQUE,
                access_token_id TEXT NOT NULL REFERENCES oauth2_access_tokens(id),
                client_id TEXT NOT NULL REFERENCES oauth2_clients(client_id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                revoked_at DATETIME
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_oauth2_refresh_tokens_access ON oauth2_refresh_tokens(access_token_id)",
        )
        .await
    }
}

/// Parse a UUID column stored as TEXT
fn parse_uuid(value: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::internal(format!("Failed to parse {column} UUID: {e}")))
}
