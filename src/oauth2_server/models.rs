// ABOUTME: OAuth 2.0 request, response and error types for the authorization server
// ABOUTME: Wire shapes for authorize, issue-code, token and introspection endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::claims::UserClaims;
use crate::errors::AppError;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;
use tracing::error;

/// OAuth 2.0 Authorization Request
///
/// Every field is optional on the wire so missing parameters surface as
/// `invalid_request` rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    /// Must be `code`
    pub response_type: Option<String>,
    /// Client identifier
    pub client_id: Option<String>,
    /// Redirect URI registered for the client
    pub redirect_uri: Option<String>,
    /// Space-delimited requested scopes
    pub scope: Option<String>,
    /// Opaque relying-party value, echoed verbatim
    pub state: Option<String>,
    /// PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// PKCE method, `S256` when absent
    pub code_challenge_method: Option<String>,
    /// Interactive surface mode, `login` or `signup`
    pub mode: Option<String>,
}

/// Consent decision posted by the interactive login surface
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueCodeRequest {
    /// Client identifier
    pub client_id: Option<String>,
    /// Redirect URI registered for the client
    pub redirect_uri: Option<String>,
    /// Space-delimited scopes shown to the user
    pub scope: Option<String>,
    /// Relying-party state; required, echoed verbatim
    pub state: Option<String>,
    /// PKCE code challenge carried from the authorize request
    pub code_challenge: Option<String>,
    /// PKCE method carried from the authorize request
    pub code_challenge_method: Option<String>,
    /// Whether the user approved the request
    #[serde(default)]
    pub consent_granted: bool,
}

/// Response to a consent decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCodeResponse {
    /// Where the login surface should send the browser
    pub redirect_url: String,
}

/// OAuth 2.0 Token Request, accepted as form or JSON
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// `authorization_code` or `refresh_token`
    pub grant_type: Option<String>,
    /// Authorization code (`authorization_code` grant)
    pub code: Option<String>,
    /// Redirect URI used in the authorize request (`authorization_code` grant)
    pub redirect_uri: Option<String>,
    /// Client identifier
    pub client_id: Option<String>,
    /// PKCE verifier (`authorization_code` grant)
    pub code_verifier: Option<String>,
    /// Refresh token (`refresh_token` grant)
    pub refresh_token: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer access token
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Opaque single-use refresh token
    pub refresh_token: String,
    /// Space-delimited granted scopes
    pub scope: String,
    /// Scope-filtered user claims; only on code exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserClaims>,
}

/// Active token description returned by introspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    /// Always `true`; inactive tokens are reported as errors
    pub active: bool,
    /// Space-delimited granted scopes
    pub scope: String,
    /// Client the token was issued to
    pub client_id: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issue time, seconds since the epoch
    pub iat: i64,
    /// Token subject (user id)
    pub sub: String,
    /// Scope-filtered user claims
    pub user: UserClaims,
}

/// OAuth 2.0 error codes (RFC 6749 Sections 4.1.2.1 and 5.2, RFC 6750)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuth2ErrorCode {
    /// Missing or malformed parameter
    InvalidRequest,
    /// Unknown or inactive client
    InvalidClient,
    /// Code or refresh token unusable
    InvalidGrant,
    /// Scope outside the client's allowance
    InvalidScope,
    /// `response_type` other than `code`
    UnsupportedResponseType,
    /// `grant_type` other than the two supported
    UnsupportedGrantType,
    /// The user declined consent
    AccessDenied,
    /// Bearer credential missing, unknown, revoked or expired
    InvalidToken,
    /// Internal failure
    ServerError,
}

impl OAuth2ErrorCode {
    /// Wire identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidScope => "invalid_scope",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::AccessDenied => "access_denied",
            Self::InvalidToken => "invalid_token",
            Self::ServerError => "server_error",
        }
    }

    /// Status used when the error is returned as JSON
    #[must_use]
    pub const fn default_status(self) -> StatusCode {
        match self {
            Self::InvalidClient | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest
            | Self::InvalidGrant
            | Self::InvalidScope
            | Self::UnsupportedResponseType
            | Self::UnsupportedGrantType => StatusCode::BAD_REQUEST,
        }
    }
}

impl Display for OAuth2ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// OAuth 2.0 Error Response
#[derive(Debug, Clone, Serialize, Error)]
#[error("{error}: {error_description}")]
pub struct OAuth2Error {
    /// Error code
    pub error: OAuth2ErrorCode,
    /// Human-readable error description
    pub error_description: String,
    /// HTTP status when rendered as JSON
    #[serde(skip)]
    pub status: StatusCode,
}

impl OAuth2Error {
    /// Create an error with the code's default status
    #[must_use]
    pub fn new(error: OAuth2ErrorCode, description: &str) -> Self {
        Self {
            error,
            error_description: description.to_owned(),
            status: error.default_status(),
        }
    }

    /// Override the HTTP status
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self::new(OAuth2ErrorCode::InvalidRequest, description)
    }

    /// Create an `invalid_client` error (401)
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::new(OAuth2ErrorCode::InvalidClient, "Invalid or inactive client")
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self::new(OAuth2ErrorCode::InvalidGrant, description)
    }

    /// Create an `invalid_scope` error
    #[must_use]
    pub fn invalid_scope(description: &str) -> Self {
        Self::new(OAuth2ErrorCode::InvalidScope, description)
    }

    /// Create an `unsupported_response_type` error
    #[must_use]
    pub fn unsupported_response_type() -> Self {
        Self::new(
            OAuth2ErrorCode::UnsupportedResponseType,
            "Only response_type=code is supported",
        )
    }

    /// Create an `unsupported_grant_type` error
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::new(OAuth2ErrorCode::UnsupportedGrantType, "Unsupported grant type")
    }

    /// Create an `access_denied` error
    #[must_use]
    pub fn access_denied() -> Self {
        Self::new(
            OAuth2ErrorCode::AccessDenied,
            "User denied the authorization request",
        )
    }

    /// Create an `invalid_token` error (401)
    #[must_use]
    pub fn invalid_token(description: &str) -> Self {
        Self::new(OAuth2ErrorCode::InvalidToken, description)
    }

    /// Create a `server_error` error (500)
    #[must_use]
    pub fn server_error(description: &str) -> Self {
        Self::new(OAuth2ErrorCode::ServerError, description)
    }
}

/// Internal faults never leak their details into protocol responses
impl From<AppError> for OAuth2Error {
    fn from(err: AppError) -> Self {
        error!(code = ?err.code, "Internal failure during OAuth2 request: {}", err.message);
        Self::server_error("Internal server error")
    }
}
