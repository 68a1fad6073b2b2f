// ABOUTME: Authorization endpoint decision engine
// ABOUTME: Silent code issuance on covering consent, otherwise hand-off to the login surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::client_registry::ClientRegistry;
use super::code_issuer::{CodeChallenge, CodeGrant, CodeIssuer};
use super::consent::ConsentStore;
use super::models::{AuthorizeRequest, OAuth2Error, OAuth2ErrorCode};
use super::redirect::{error_redirect, with_query};
use super::scopes::ScopeSet;
use accounts_core::constants::oauth::{MODE_LOGIN, MODE_SIGNUP, RESPONSE_TYPE_CODE};
use accounts_core::models::OAuth2Client;
use http::StatusCode;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where the browser goes after an authorize request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    /// Consent covered the request; redirect carries `code` and `state`
    CodeIssued {
        /// Relying-party redirect with the code
        redirect_url: String,
    },
    /// The user must log in or consent interactively
    LoginRequired {
        /// Login surface URL carrying the original parameters
        login_url: String,
    },
    /// Failure after the redirect was validated; redirect carries `error`
    ErrorRedirect {
        /// Relying-party redirect with the error
        redirect_url: String,
    },
}

impl AuthorizeOutcome {
    /// The `Location` header value
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::CodeIssued { redirect_url } | Self::ErrorRedirect { redirect_url } => redirect_url,
            Self::LoginRequired { login_url } => login_url,
        }
    }
}

/// Validated view of an authorize request
struct ValidatedAuthorize<'a> {
    client: OAuth2Client,
    redirect_uri: &'a str,
    state: &'a str,
    scopes: ScopeSet,
    challenge: Option<CodeChallenge<'a>>,
    mode: &'static str,
}

/// Decides between silent issuance and the interactive surface
#[derive(Clone)]
pub struct AuthorizationEngine {
    clients: ClientRegistry,
    consents: ConsentStore,
    codes: CodeIssuer,
    login_url: String,
}

impl AuthorizationEngine {
    /// Creates a new decision engine; `login_url` is the interactive surface's authorize page
    #[must_use]
    pub const fn new(
        clients: ClientRegistry,
        consents: ConsentStore,
        codes: CodeIssuer,
        login_url: String,
    ) -> Self {
        Self {
            clients,
            consents,
            codes,
            login_url,
        }
    }

    /// Handle an authorization request in a single pass
    ///
    /// # Errors
    /// Returns a 400 error for failures detected before the redirect URI is
    /// trusted: `unsupported_response_type`, `invalid_request`, `invalid_client`
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
        caller: Option<Uuid>,
    ) -> Result<AuthorizeOutcome, OAuth2Error> {
        if request.response_type.as_deref() != Some(RESPONSE_TYPE_CODE) {
            return Err(OAuth2Error::unsupported_response_type());
        }

        let (Some(client_id), Some(redirect_uri), Some(state)) = (
            non_empty(request.client_id.as_deref()),
            non_empty(request.redirect_uri.as_deref()),
            non_empty(request.state.as_deref()),
        ) else {
            return Err(OAuth2Error::invalid_request(
                "Missing required parameters: client_id, redirect_uri, state",
            ));
        };

        let client = self
            .clients
            .resolve_active(client_id)
            .await
            .map_err(|e| e.with_status(StatusCode::BAD_REQUEST))?;
        let scopes = ScopeSet::parse_or_default(request.scope.as_deref());
        match ClientRegistry::validate(&client, redirect_uri, &scopes) {
            Ok(()) => {}
            Err(err) if err.error == OAuth2ErrorCode::InvalidScope => {
                return Self::redirect_error(redirect_uri, &err, state);
            }
            Err(err) => return Err(err),
        }

        // The redirect is trusted from here on; errors travel back through it
        let validated =
            match Self::validate_after_redirect(client, redirect_uri, state, scopes, request) {
                Ok(validated) => validated,
                Err(err) => return Self::redirect_error(redirect_uri, &err, state),
            };

        match self.decide(&validated, caller).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => Self::redirect_error(redirect_uri, &err, state),
        }
    }

    fn validate_after_redirect<'a>(
        client: OAuth2Client,
        redirect_uri: &'a str,
        state: &'a str,
        scopes: ScopeSet,
        request: &'a AuthorizeRequest,
    ) -> Result<ValidatedAuthorize<'a>, OAuth2Error> {
        let challenge = CodeChallenge::from_request(
            request.code_challenge.as_deref(),
            request.code_challenge_method.as_deref(),
        )?;
        let mode = match request.mode.as_deref() {
            Some(MODE_SIGNUP) => MODE_SIGNUP,
            _ => MODE_LOGIN,
        };

        Ok(ValidatedAuthorize {
            client,
            redirect_uri,
            state,
            scopes,
            challenge,
            mode,
        })
    }

    async fn decide(
        &self,
        request: &ValidatedAuthorize<'_>,
        caller: Option<Uuid>,
    ) -> Result<AuthorizeOutcome, OAuth2Error> {
        let client_id = request.client.client_id.as_str();

        if let Some(user_id) = caller {
            let consent = self.consents.find_active(user_id, client_id).await?;
            if consent.is_some_and(|c| ConsentStore::covers(&c, &request.scopes)) {
                let code = self
                    .codes
                    .issue(&CodeGrant {
                        client_id,
                        redirect_uri: request.redirect_uri,
                        user_id,
                        scope: &request.scopes,
                        challenge: request.challenge,
                    })
                    .await?;
                info!(client_id = %client_id, user_id = %user_id, "Consent covers request, code issued silently");
                let redirect_url = with_query(
                    request.redirect_uri,
                    &[("code", Some(code.as_str())), ("state", Some(request.state))],
                )?;
                return Ok(AuthorizeOutcome::CodeIssued { redirect_url });
            }
            debug!(client_id = %client_id, user_id = %user_id, "No covering consent, interactive consent required");
        }

        let scope = request.scopes.to_string();
        let login_url = with_query(
            &self.login_url,
            &[
                ("client_id", Some(client_id)),
                ("redirect_uri", Some(request.redirect_uri)),
                ("scope", Some(scope.as_str())),
                ("state", Some(request.state)),
                ("response_type", Some(RESPONSE_TYPE_CODE)),
                ("code_challenge", request.challenge.map(|c| c.challenge)),
                (
                    "code_challenge_method",
                    request.challenge.map(|c| c.method.as_str()),
                ),
                ("mode", Some(request.mode)),
                ("client_name", Some(request.client.client_name.as_str())),
            ],
        )?;
        Ok(AuthorizeOutcome::LoginRequired { login_url })
    }

    fn redirect_error(
        redirect_uri: &str,
        err: &OAuth2Error,
        state: &str,
    ) -> Result<AuthorizeOutcome, OAuth2Error> {
        warn!(error = %err, "Authorization request failed after redirect validation");
        let redirect_url = error_redirect(redirect_uri, err, Some(state))?;
        Ok(AuthorizeOutcome::ErrorRedirect { redirect_url })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
