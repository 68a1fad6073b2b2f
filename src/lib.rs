// ABOUTME: Main library entry point for the Alsamos accounts authorization server
// ABOUTME: OAuth 2.0 authorization code flow with PKCE, consent tracking and refresh rotation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Alsamos Accounts
//!
//! The authorization server behind "Sign in with Alsamos". Relying parties
//! send users to `/oauth2/authorize`, exchange the resulting single-use
//! code for an opaque access/refresh token pair at `/oauth2/token`, and
//! validate access tokens at `/oauth2/introspect`.
//!
//! ## Architecture
//!
//! - **`oauth2_server`**: protocol logic (client registry, consent store,
//!   decision engine, code issuer, token issuer, introspection)
//! - **`database`**: `SQLite` persistence with conditional writes for
//!   single-use codes and transactional refresh rotation
//! - **`routes`**: axum handlers and middleware layers
//! - **`auth`**: verification of the login surface's session credential
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use alsamos_accounts::config::ServerConfig;
//! use alsamos_accounts::database::Database;
//! use alsamos_accounts::resources::ServerResources;
//! use alsamos_accounts::routes;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::new(&config.database_url).await?;
//!     let app = routes::router(Arc::new(ServerResources::new(database, config)));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// Session credential verification
pub mod auth;

/// Environment configuration
pub mod config;

/// `SQLite` persistence
pub mod database;

/// Unified error handling
pub mod errors;

/// Identity collaborator boundary
pub mod identity;

/// Structured logging setup
pub mod logging;

/// HTTP middleware layers
pub mod middleware;

/// OAuth 2.0 authorization server
pub mod oauth2_server;

/// Shared resources for handlers
pub mod resources;

/// HTTP routes
pub mod routes;
