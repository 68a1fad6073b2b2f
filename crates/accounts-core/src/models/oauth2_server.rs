// ABOUTME: OAuth 2.0 server persistence models for clients, consents, codes and tokens
// ABOUTME: Secrets are stored as SHA-256 digests; plaintext only exists in responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered relying party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Client {
    /// OAuth 2.0 client identifier
    pub client_id: String,
    /// Human-readable client name shown on the consent surface
    pub client_name: String,
    /// Exact redirect URIs accepted for this client
    pub redirect_uris: Vec<String>,
    /// Scopes this client may request
    pub allowed_scopes: Vec<String>,
    /// Inactive clients are treated as unknown
    pub is_active: bool,
    /// When this client was provisioned
    pub created_at: DateTime<Utc>,
}

impl OAuth2Client {
    /// Exact string membership against the registered redirect URIs
    #[must_use]
    pub fn has_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }

    /// Whether `scope` is in the client's allowed set
    #[must_use]
    pub fn allows_scope(&self, scope: &str) -> bool {
        self.allowed_scopes.iter().any(|allowed| allowed == scope)
    }
}

/// Standing grant of scopes from a user to a client
#[derive(Debug, Clone)]
pub struct OAuth2Consent {
    /// Record identifier
    pub id: Uuid,
    /// User who granted consent
    pub user_id: Uuid,
    /// Client the consent was granted to
    pub client_id: String,
    /// Space-delimited granted scopes
    pub scope: String,
    /// When the scope set was last granted
    pub granted_at: DateTime<Utc>,
    /// Set when the consent is withdrawn
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Single-use authorization code
#[derive(Debug, Clone)]
pub struct OAuth2AuthorizationCode {
    /// SHA-256 hex digest of the code value
    pub code_hash: String,
    /// Client the code was issued to
    pub client_id: String,
    /// User who authorized the code
    pub user_id: Uuid,
    /// Redirect URI that must match during exchange
    pub redirect_uri: String,
    /// Space-delimited granted scopes
    pub scope: String,
    /// PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// PKCE method; meaningful only with a challenge
    pub code_challenge_method: String,
    /// Issue time
    pub created_at: DateTime<Utc>,
    /// The code is dead after this instant
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, when the code is exchanged
    pub used_at: Option<DateTime<Utc>>,
}

/// Opaque bearer access token
#[derive(Debug, Clone)]
pub struct OAuth2AccessToken {
    /// Record identifier, referenced by the paired refresh token
    pub id: Uuid,
    /// SHA-256 hex digest of the token value
    pub token_hash: String,
    /// Client the token was issued to
    pub client_id: String,
    /// Token subject
    pub user_id: Uuid,
    /// Space-delimited granted scopes
    pub scope: String,
    /// Issue time
    pub created_at: DateTime<Utc>,
    /// Expiry instant
    pub expires_at: DateTime<Utc>,
    /// Set when superseded by a refresh
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Opaque single-use refresh token
#[derive(Debug, Clone)]
pub struct OAuth2RefreshToken {
    /// Record identifier
    pub id: Uuid,
    /// SHA-256 hex digest of the token value
    pub token_hash: String,
    /// Access token issued alongside this refresh token
    pub access_token_id: Uuid,
    /// Client the token was issued to
    pub client_id: String,
    /// Token subject
    pub user_id: Uuid,
    /// Scope carried forward on rotation
    pub scope: String,
    /// Issue time
    pub created_at: DateTime<Utc>,
    /// Expiry instant
    pub expires_at: DateTime<Utc>,
    /// Set when consumed by a refresh
    pub revoked_at: Option<DateTime<Utc>>,
}
