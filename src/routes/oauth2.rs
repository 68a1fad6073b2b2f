// ABOUTME: OAuth 2.0 server route handlers for the authorization server endpoints
// ABOUTME: Authorize, issue-code, token, introspection and RFC 8414 discovery over axum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! OAuth 2.0 routes
//!
//! - `GET /oauth2/authorize` - authorization decision, answered with a 302
//! - `POST /oauth2/issue-code` - consent decision from the login surface
//! - `POST /oauth2/token` - code exchange and refresh rotation
//! - `POST /oauth2/introspect` (alias `/oauth2/verify`) - access token check
//! - `GET /.well-known/oauth-authorization-server` - server metadata

use crate::oauth2_server::{
    AuthorizeRequest, IssueCodeRequest, OAuth2Error, OAuth2ErrorCode, TokenRequest,
};
use crate::resources::ServerResources;
use accounts_core::constants::{oauth, scopes};
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, Query, Request, State,
    },
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION, PRAGMA, WWW_AUTHENTICATE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        let status = self.status;
        if self.error == OAuth2ErrorCode::InvalidToken {
            let challenge = format!(
                "Bearer error=\"invalid_token\", error_description=\"{}\"",
                self.error_description.replace('"', "'")
            );
            return (status, [(WWW_AUTHENTICATE, challenge)], Json(self)).into_response();
        }
        (status, Json(self)).into_response()
    }
}

/// Token request body accepted as `application/x-www-form-urlencoded` or JSON
pub struct TokenRequestBody(pub TokenRequest);

#[async_trait]
impl<S> FromRequest<S> for TokenRequestBody
where
    S: Send + Sync,
{
    type Rejection = OAuth2Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<TokenRequest>::from_request(req, state)
                .await
                .map_err(|e| {
                    OAuth2Error::invalid_request(&format!("Invalid JSON body: {}", e.body_text()))
                })?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<TokenRequest>::from_request(req, state)
                .await
                .map_err(|e| {
                    OAuth2Error::invalid_request(&format!("Invalid form body: {}", e.body_text()))
                })?;
            Ok(Self(body))
        }
    }
}

/// OAuth 2.0 routes implementation
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all OAuth 2.0 routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/oauth2/authorize", get(Self::handle_authorize))
            .route("/oauth2/issue-code", post(Self::handle_issue_code))
            .route("/oauth2/token", post(Self::handle_token))
            .route("/oauth2/introspect", post(Self::handle_introspect))
            .route("/oauth2/verify", post(Self::handle_introspect))
            .route(
                "/.well-known/oauth-authorization-server",
                get(Self::handle_discovery),
            )
            .with_state(resources)
    }

    /// Verify the session credential, if one was presented
    fn session_user(
        resources: &ServerResources,
        bearer: Option<&TypedHeader<Authorization<Bearer>>>,
    ) -> Option<Uuid> {
        let TypedHeader(Authorization(bearer)) = bearer?;
        match resources.session_auth.verify(bearer.token()) {
            Ok(user_id) => Some(user_id),
            Err(e) => {
                debug!(error = %e, "Ignoring unusable session credential");
                None
            }
        }
    }

    /// Handle GET /oauth2/authorize
    async fn handle_authorize(
        State(resources): State<Arc<ServerResources>>,
        bearer: Option<TypedHeader<Authorization<Bearer>>>,
        query: Result<Query<AuthorizeRequest>, QueryRejection>,
    ) -> Response {
        let Query(request) = match query {
            Ok(query) => query,
            Err(e) => {
                return OAuth2Error::invalid_request(&format!(
                    "Invalid query string: {}",
                    e.body_text()
                ))
                .into_response();
            }
        };

        let caller = Self::session_user(&resources, bearer.as_ref());
        match resources.oauth2_server.authorize(&request, caller).await {
            Ok(outcome) => (StatusCode::FOUND, [(LOCATION, outcome.location().to_owned())])
                .into_response(),
            Err(e) => e.into_response(),
        }
    }

    /// Handle POST /oauth2/issue-code
    async fn handle_issue_code(
        State(resources): State<Arc<ServerResources>>,
        bearer: Option<TypedHeader<Authorization<Bearer>>>,
        body: Result<Json<IssueCodeRequest>, JsonRejection>,
    ) -> Result<Response, OAuth2Error> {
        let Some(user_id) = Self::session_user(&resources, bearer.as_ref()) else {
            return Err(OAuth2Error::invalid_token(
                "Missing or invalid session credential",
            ));
        };

        let Json(request) = body.map_err(|e| {
            OAuth2Error::invalid_request(&format!("Invalid JSON body: {}", e.body_text()))
        })?;

        let response = resources
            .oauth2_server
            .issue_code(&request, user_id)
            .await?;
        info!(
            user_id = %user_id,
            client_id = request.client_id.as_deref().unwrap_or_default(),
            consent_granted = request.consent_granted,
            "Consent decision recorded"
        );
        Ok(Json(response).into_response())
    }

    /// Handle POST /oauth2/token
    async fn handle_token(
        State(resources): State<Arc<ServerResources>>,
        body: Result<TokenRequestBody, OAuth2Error>,
    ) -> Response {
        let result = match body {
            Ok(TokenRequestBody(request)) => resources.oauth2_server.token(request).await,
            Err(e) => Err(e),
        };

        let no_store = [(CACHE_CONTROL, "no-store"), (PRAGMA, "no-cache")];
        match result {
            Ok(response) => (no_store, Json(response)).into_response(),
            Err(e) => (no_store, e).into_response(),
        }
    }

    /// Handle POST /oauth2/introspect and /oauth2/verify
    async fn handle_introspect(
        State(resources): State<Arc<ServerResources>>,
        bearer: Option<TypedHeader<Authorization<Bearer>>>,
    ) -> Result<Response, OAuth2Error> {
        let token = bearer.as_ref().map(|TypedHeader(Authorization(b))| b.token());
        let response = resources.oauth2_server.introspect(token).await?;
        Ok(Json(response).into_response())
    }

    /// Handle GET /.well-known/oauth-authorization-server (RFC 8414)
    async fn handle_discovery(State(resources): State<Arc<ServerResources>>) -> Response {
        let issuer = &resources.config.issuer_url;
        let metadata = json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}/oauth2/authorize"),
            "token_endpoint": format!("{issuer}/oauth2/token"),
            "introspection_endpoint": format!("{issuer}/oauth2/introspect"),
            "response_types_supported": [oauth::RESPONSE_TYPE_CODE],
            "grant_types_supported": [oauth::GRANT_AUTHORIZATION_CODE, oauth::GRANT_REFRESH_TOKEN],
            "code_challenge_methods_supported": [oauth::PKCE_METHOD_S256, oauth::PKCE_METHOD_PLAIN],
            "scopes_supported": [scopes::OPENID, scopes::PROFILE, scopes::EMAIL],
            "token_endpoint_auth_methods_supported": ["none"],
            "introspection_endpoint_auth_methods_supported": ["bearer"]
        });
        Json(metadata).into_response()
    }
}
