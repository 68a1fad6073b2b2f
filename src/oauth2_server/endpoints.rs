// ABOUTME: OAuth 2.0 authorization server facade used by the HTTP layer
// ABOUTME: Wires registry, consent store, code issuer, token issuer and introspector
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::authorization::{AuthorizationEngine, AuthorizeOutcome};
use super::client_registry::ClientRegistry;
use super::code_issuer::CodeIssuer;
use super::consent::ConsentStore;
use super::introspection::TokenIntrospector;
use super::token_issuer::TokenIssuer;
use super::models::{
    AuthorizeRequest, IntrospectionResponse, IssueCodeRequest, IssueCodeResponse, OAuth2Error,
    TokenRequest, TokenResponse,
};
use crate::database::Database;
use crate::errors::AppResult;
use crate::identity::IdentityResolver;
use std::sync::Arc;
use uuid::Uuid;

/// OAuth 2.0 Authorization Server
#[derive(Clone)]
pub struct OAuth2AuthorizationServer {
    clients: ClientRegistry,
    consents: ConsentStore,
    authorization: AuthorizationEngine,
    codes: CodeIssuer,
    tokens: TokenIssuer,
    introspector: TokenIntrospector,
}

impl OAuth2AuthorizationServer {
    /// Build the server over shared storage
    ///
    /// `login_url` is the interactive surface's authorize page, where users
    /// without a covering consent are sent.
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        identities: Arc<dyn IdentityResolver>,
        login_url: String,
    ) -> Self {
        let clients = ClientRegistry::new(database.clone());
        let consents = ConsentStore::new(database.clone());
        let codes = CodeIssuer::new(database.clone(), clients.clone(), consents.clone());
        let authorization =
            AuthorizationEngine::new(clients.clone(), consents.clone(), codes.clone(), login_url);
        let tokens =
            TokenIssuer::new(database.clone(), clients.clone(), identities.clone());
        let introspector = TokenIntrospector::new(database, identities);

        Self {
            clients,
            consents,
            authorization,
            codes,
            tokens,
            introspector,
        }
    }

    /// Handle authorization request (GET /oauth2/authorize)
    ///
    /// # Errors
    /// Returns a 400 error when the request cannot be answered through its redirect
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
        caller: Option<Uuid>,
    ) -> Result<AuthorizeOutcome, OAuth2Error> {
        self.authorization.authorize(request, caller).await
    }

    /// Handle the login surface's consent decision (POST /oauth2/issue-code)
    ///
    /// # Errors
    /// Returns 400 for client or redirect problems, 500 for storage failures
    pub async fn issue_code(
        &self,
        request: &IssueCodeRequest,
        user_id: Uuid,
    ) -> Result<IssueCodeResponse, OAuth2Error> {
        self.codes.decide_consent(request, user_id).await
    }

    /// Handle token request (POST /oauth2/token)
    ///
    /// # Errors
    /// Returns an OAuth2 error for every rejected exchange or rotation
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        self.tokens.token(request).await
    }

    /// Handle introspection request (POST /oauth2/introspect)
    ///
    /// # Errors
    /// Returns `invalid_token` for unusable tokens
    pub async fn introspect(
        &self,
        bearer: Option<&str>,
    ) -> Result<IntrospectionResponse, OAuth2Error> {
        self.introspector.introspect(bearer).await
    }

    /// Withdraw a user's consent for a client
    ///
    /// # Errors
    /// Returns an error if the write fails
    pub async fn revoke_consent(&self, user_id: Uuid, client_id: &str) -> AppResult<bool> {
        self.consents.revoke(user_id, client_id).await
    }

    /// Client registry, for provisioning
    #[must_use]
    pub const fn clients(&self) -> &ClientRegistry {
        &self.clients
    }
}
