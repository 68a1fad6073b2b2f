// ABOUTME: Internal error type for the accounts authorization server
// ABOUTME: AppError carries a kind, a message and an optional source, with HTTP status mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Internal faults (storage, configuration, identity lookup, admin input)
//! are carried as [`AppError`]. Relying parties never see one directly: the
//! protocol layer maps it to `server_error`. The operational routes render
//! it as an [`ErrorBody`].

#[cfg(feature = "http-response")]
use axum::{
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "http-response")]
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// What went wrong, independent of the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Operator or caller input was rejected
    InvalidInput,
    /// Client, user or consent lookup came back empty
    NotFound,
    /// Unique key (client id, email) already taken
    Conflict,
    /// Missing or unusable setting
    Config,
    /// Store is not answering
    StorageUnavailable,
    /// Query or transaction failure
    Storage,
    /// Stored JSON could not be encoded or decoded
    Serialization,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// HTTP status used when the error is rendered directly
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::StorageUnavailable => 503,
            Self::Config | Self::Storage | Self::Serialization | Self::Internal => 500,
        }
    }

    /// Text safe to show when the message itself must stay in the logs
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::NotFound => "Not found",
            Self::Conflict => "Already exists",
            Self::Config => "Server misconfigured",
            Self::StorageUnavailable => "Storage unavailable",
            Self::Storage => "Storage failure",
            Self::Serialization => "Stored data could not be decoded",
            Self::Internal => "Internal error",
        }
    }
}

/// Internal error with an optional underlying cause
#[derive(Debug, Error)]
pub struct AppError {
    /// Kind of failure
    pub code: ErrorCode,
    /// Detail for logs and operator output
    pub message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Error of the given kind
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    fn caused_by(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Lookup of `what` found nothing
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", what.into()))
    }

    /// `what` collides with an existing record
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, format!("{} already exists", what.into()))
    }

    /// Rejected caller or operator input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing or unusable setting
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, message)
    }

    /// Store did not answer a liveness probe
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageUnavailable, message)
    }

    /// Query or transaction failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Storage, message)
    }

    /// Unclassified failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Status of the underlying [`ErrorCode`]
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.summary(), self.message)
    }
}

/// Result alias used across the server
pub type AppResult<T> = Result<T, AppError>;

/// JSON body for errors rendered outside the OAuth2 endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Kind of failure
    pub code: ErrorCode,
    /// Caller-safe message
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(error: &AppError) -> Self {
        // 5xx detail stays server-side
        let message = if error.http_status() >= 500 {
            error.code.summary().to_owned()
        } else {
            error.message.clone()
        };
        Self {
            code: error.code,
            message,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::Serialization, error.to_string()).caused_by(error)
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string()).caused_by(error)
    }
}

#[cfg(feature = "http-response")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = ?self.code, error = %self.message, "Request failed");
        }
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
