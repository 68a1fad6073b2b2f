// ABOUTME: Transaction guard for the multi-row writes of code exchange and refresh rotation
// ABOUTME: Dropping the guard without commit discards every write made through it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! A code exchange marks the code used and inserts an access and refresh
//! token; a rotation revokes the old pair and inserts a new one. Either all
//! of those rows land or none do. Any early return, `?` included, drops the
//! guard and sqlx rolls the transaction back:
//!
//! ```text
//! let mut guard = database.begin().await?;
//! if !Database::mark_authorization_code_used(&mut guard, &hash, client_id, now).await? {
//!     return Err(...);
//! }
//! Database::insert_access_token(&mut guard, &access).await?;
//! guard.commit().await?;
//! ```

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

/// Open `SQLite` transaction that rolls back unless committed
pub struct SqliteTransactionGuard<'c> {
    open: Option<Transaction<'c, Sqlite>>,
}

impl<'c> SqliteTransactionGuard<'c> {
    pub(super) fn new(transaction: Transaction<'c, Sqlite>) -> Self {
        Self {
            open: Some(transaction),
        }
    }

    /// Connection to run statements on inside the transaction
    ///
    /// # Errors
    ///
    /// Returns an error once the guard has been committed or rolled back
    pub fn executor(&mut self) -> AppResult<&mut SqliteConnection> {
        self.open
            .as_deref_mut()
            .ok_or_else(|| AppError::internal("Write transaction already finished"))
    }

    /// Make every write through this guard visible
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` refuses the commit (for example `SQLITE_BUSY`)
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self.finish()?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Commit failed: {e}")))?;
        debug!("Write transaction committed");
        Ok(())
    }

    /// Discard every write through this guard now rather than on drop
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback statement fails
    #[cfg(test)]
    pub(crate) async fn rollback(mut self) -> AppResult<()> {
        let tx = self.finish()?;
        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Rollback failed: {e}")))?;
        debug!("Write transaction rolled back");
        Ok(())
    }

    fn finish(&mut self) -> AppResult<Transaction<'c, Sqlite>> {
        self.open
            .take()
            .ok_or_else(|| AppError::internal("Write transaction already finished"))
    }
}

impl Drop for SqliteTransactionGuard<'_> {
    fn drop(&mut self) {
        if self.open.is_some() {
            warn!("Write transaction abandoned, rolling back");
        }
    }
}
