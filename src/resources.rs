// ABOUTME: Centralized resource container for dependency injection in the HTTP layer
// ABOUTME: Holds the database, OAuth 2.0 server, session verifier and configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Built once at startup and shared with every handler through axum state.

use crate::auth::SessionAuthenticator;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::identity::IdentityResolver;
use crate::oauth2_server::OAuth2AuthorizationServer;
use std::sync::Arc;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Shared storage
    pub database: Arc<Database>,
    /// Authorization server operations
    pub oauth2_server: Arc<OAuth2AuthorizationServer>,
    /// Session credential verifier
    pub session_auth: Arc<SessionAuthenticator>,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wire resources with the database acting as the identity resolver
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let database = Arc::new(database);
        let identities: Arc<dyn IdentityResolver> = database.clone();
        Self::with_identity_resolver(database, identities, config)
    }

    /// Wire resources with an external identity resolver
    #[must_use]
    pub fn with_identity_resolver(
        database: Arc<Database>,
        identities: Arc<dyn IdentityResolver>,
        config: ServerConfig,
    ) -> Self {
        let oauth2_server = Arc::new(OAuth2AuthorizationServer::new(
            database.clone(),
            identities,
            config.login_url(),
        ));
        let session_auth = Arc::new(SessionAuthenticator::new(&config.auth.session_jwt_secret));

        Self {
            database,
            oauth2_server,
            session_auth,
            config: Arc::new(config),
        }
    }
}
