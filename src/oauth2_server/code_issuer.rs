// ABOUTME: Authorization code issuance and the interactive consent decision
// ABOUTME: Codes are single-use, bound to client, redirect, user, scope and PKCE challenge
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::client_registry::ClientRegistry;
use super::consent::ConsentStore;
use super::models::{IssueCodeRequest, IssueCodeResponse, OAuth2Error, OAuth2ErrorCode};
use super::pkce::PkceMethod;
use super::redirect::{error_redirect, with_query};
use super::scopes::ScopeSet;
use super::secrets::{generate_authorization_code, hash_secret};
use crate::database::Database;
use crate::errors::AppResult;
use accounts_core::constants::lifetimes::AUTHORIZATION_CODE_TTL_MINUTES;
use accounts_core::models::{OAuth2AuthorizationCode, OAuth2Client};
use chrono::{Duration, Utc};
use http::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// PKCE challenge bound to a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeChallenge<'a> {
    /// Challenge value from the authorize request
    pub challenge: &'a str,
    /// How the verifier will be checked
    pub method: PkceMethod,
}

impl<'a> CodeChallenge<'a> {
    /// Resolve the optional challenge parameters of a request
    ///
    /// A blank challenge counts as absent. A challenge without a method
    /// uses `S256`.
    ///
    /// # Errors
    /// Returns `invalid_request` for an unsupported method
    pub fn from_request(
        challenge: Option<&'a str>,
        method: Option<&str>,
    ) -> Result<Option<Self>, OAuth2Error> {
        let Some(challenge) = challenge.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let method = PkceMethod::parse_or_default(method)
            .ok_or_else(|| OAuth2Error::invalid_request("Unsupported code_challenge_method"))?;
        Ok(Some(Self { challenge, method }))
    }
}

/// Everything a new code is bound to
#[derive(Debug, Clone, Copy)]
pub struct CodeGrant<'a> {
    /// Client the code is issued to
    pub client_id: &'a str,
    /// Redirect the exchange must repeat
    pub redirect_uri: &'a str,
    /// Authorizing user
    pub user_id: Uuid,
    /// Granted scopes
    pub scope: &'a ScopeSet,
    /// Optional PKCE binding
    pub challenge: Option<CodeChallenge<'a>>,
}

/// Issues single-use authorization codes
#[derive(Clone)]
pub struct CodeIssuer {
    database: Arc<Database>,
    clients: ClientRegistry,
    consents: ConsentStore,
}

impl CodeIssuer {
    /// Creates a new code issuer
    #[must_use]
    pub const fn new(database: Arc<Database>, clients: ClientRegistry, consents: ConsentStore) -> Self {
        Self {
            database,
            clients,
            consents,
        }
    }

    /// Create and persist a fresh code; returns the plaintext value
    ///
    /// # Errors
    /// Returns an error if the code cannot be stored
    pub async fn issue(&self, grant: &CodeGrant<'_>) -> AppResult<String> {
        let code = generate_authorization_code();
        let now = Utc::now();

        let record = OAuth2AuthorizationCode {
            code_hash: hash_secret(&code),
            client_id: grant.client_id.to_owned(),
            user_id: grant.user_id,
            redirect_uri: grant.redirect_uri.to_owned(),
            scope: grant.scope.to_string(),
            code_challenge: grant.challenge.map(|c| c.challenge.to_owned()),
            code_challenge_method: grant
                .challenge
                .map_or(PkceMethod::S256, |c| c.method)
                .as_str()
                .to_owned(),
            created_at: now,
            expires_at: now + Duration::minutes(AUTHORIZATION_CODE_TTL_MINUTES),
            used_at: None,
        };
        self.database.store_authorization_code(&record).await?;

        info!(
            client_id = %grant.client_id,
            user_id = %grant.user_id,
            pkce = grant.challenge.is_some(),
            "Issued authorization code"
        );
        Ok(code)
    }

    /// Apply the user's consent decision from the login surface
    ///
    /// Client and redirect are re-validated here because this call does not
    /// trust anything carried through the browser. Failures after the
    /// redirect is known (denial, bad scope) come back as a redirect URL.
    ///
    /// # Errors
    /// Returns `invalid_request`/`invalid_client` (400) before the redirect is
    /// validated, or `server_error` on storage failure
    pub async fn decide_consent(
        &self,
        request: &IssueCodeRequest,
        user_id: Uuid,
    ) -> Result<IssueCodeResponse, OAuth2Error> {
        let (Some(client_id), Some(redirect_uri), Some(state)) = (
            request.client_id.as_deref().filter(|s| !s.is_empty()),
            request.redirect_uri.as_deref().filter(|s| !s.is_empty()),
            request.state.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(OAuth2Error::invalid_request(
                "Missing required parameters: client_id, redirect_uri, state",
            ));
        };
        let state = Some(state);

        let client = self
            .clients
            .resolve_active(client_id)
            .await
            .map_err(|e| e.with_status(StatusCode::BAD_REQUEST))?;
        ClientRegistry::validate_redirect_uri(&client, redirect_uri)?;

        if !request.consent_granted {
            info!(client_id = %client_id, user_id = %user_id, "User denied authorization");
            let redirect_url = error_redirect(redirect_uri, &OAuth2Error::access_denied(), state)?;
            return Ok(IssueCodeResponse { redirect_url });
        }

        let redirect_url = match self.approve(&client, redirect_uri, request, user_id).await {
            Ok(code) => with_query(redirect_uri, &[("code", Some(code.as_str())), ("state", state)])?,
            Err(err) if err.error == OAuth2ErrorCode::ServerError => return Err(err),
            Err(err) => {
                warn!(client_id = %client_id, error = %err, "Consent approval rejected");
                error_redirect(redirect_uri, &err, state)?
            }
        };
        Ok(IssueCodeResponse { redirect_url })
    }

    async fn approve(
        &self,
        client: &OAuth2Client,
        redirect_uri: &str,
        request: &IssueCodeRequest,
        user_id: Uuid,
    ) -> Result<String, OAuth2Error> {
        let scopes = ScopeSet::parse_or_default(request.scope.as_deref());
        ClientRegistry::validate_scopes(client, &scopes)?;
        let challenge = CodeChallenge::from_request(
            request.code_challenge.as_deref(),
            request.code_challenge_method.as_deref(),
        )?;

        self.consents
            .upsert(user_id, &client.client_id, &scopes)
            .await?;

        let code = self
            .issue(&CodeGrant {
                client_id: &client.client_id,
                redirect_uri,
                user_id,
                scope: &scopes,
                challenge,
            })
            .await?;
        Ok(code)
    }
}
