// ABOUTME: Token endpoint: authorization code exchange and refresh token rotation
// ABOUTME: PKCE verification, expiry checks and atomic consume-and-issue transactions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::claims::{resolve_claims, UserClaims};
use super::client_registry::ClientRegistry;
use super::models::{OAuth2Error, TokenRequest, TokenResponse};
use super::pkce::PkceMethod;
use super::scopes::ScopeSet;
use super::secrets::{generate_token, hash_secret};
use crate::database::{Database, SqliteTransactionGuard};
use crate::errors::AppResult;
use crate::identity::IdentityResolver;
use accounts_core::constants::lifetimes::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_DAYS};
use accounts_core::constants::oauth::{
    GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN, TOKEN_TYPE_BEARER,
};
use accounts_core::models::{
    OAuth2AccessToken, OAuth2AuthorizationCode, OAuth2Client, OAuth2RefreshToken,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// `authorization_code` grant parameters
#[derive(Debug, Clone)]
pub struct AuthorizationCodeGrant {
    /// Code from the authorize redirect
    pub code: String,
    /// Must equal the redirect the code was issued for
    pub redirect_uri: String,
    /// Required when the code carries a PKCE challenge
    pub code_verifier: Option<String>,
}

/// `refresh_token` grant parameters
#[derive(Debug, Clone)]
pub struct RefreshTokenGrant {
    /// Refresh token from a previous token response
    pub refresh_token: String,
}

/// Closed set of supported grants
#[derive(Debug, Clone)]
pub enum TokenGrant {
    /// Exchange an authorization code
    AuthorizationCode(AuthorizationCodeGrant),
    /// Rotate a refresh token
    RefreshToken(RefreshTokenGrant),
}

impl TokenGrant {
    /// Parse the grant from a token request
    ///
    /// # Errors
    /// Returns `unsupported_grant_type` for unknown grants and
    /// `invalid_request` for missing grant parameters
    pub fn parse(request: TokenRequest) -> Result<Self, OAuth2Error> {
        match request.grant_type.as_deref() {
            Some(GRANT_AUTHORIZATION_CODE) => {
                let (Some(code), Some(redirect_uri)) = (
                    request.code.filter(|c| !c.is_empty()),
                    request.redirect_uri.filter(|r| !r.is_empty()),
                ) else {
                    return Err(OAuth2Error::invalid_request(
                        "Missing required parameters: code, redirect_uri",
                    ));
                };
                Ok(Self::AuthorizationCode(AuthorizationCodeGrant {
                    code,
                    redirect_uri,
                    code_verifier: request.code_verifier.filter(|v| !v.is_empty()),
                }))
            }
            Some(GRANT_REFRESH_TOKEN) => {
                let refresh_token = request
                    .refresh_token
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| OAuth2Error::invalid_request("Missing refresh_token"))?;
                Ok(Self::RefreshToken(RefreshTokenGrant { refresh_token }))
            }
            None => Err(OAuth2Error::invalid_request("Missing grant_type")),
            Some(_) => Err(OAuth2Error::unsupported_grant_type()),
        }
    }
}

/// Freshly minted access/refresh pair; plaintext values exist only here
struct IssuedPair {
    access_token: String,
    refresh_token: String,
    access: OAuth2AccessToken,
    refresh: OAuth2RefreshToken,
}

impl IssuedPair {
    fn mint(client_id: &str, user_id: Uuid, scope: &str, now: DateTime<Utc>) -> Self {
        let access_token = generate_token();
        let refresh_token = generate_token();

        let access = OAuth2AccessToken {
            id: Uuid::new_v4(),
            token_hash: hash_secret(&access_token),
            client_id: client_id.to_owned(),
            user_id,
            scope: scope.to_owned(),
            created_at: now,
            expires_at: now + Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            revoked_at: None,
        };
        let refresh = OAuth2RefreshToken {
            id: Uuid::new_v4(),
            token_hash: hash_secret(&refresh_token),
            access_token_id: access.id,
            client_id: client_id.to_owned(),
            user_id,
            scope: scope.to_owned(),
            created_at: now,
            expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            revoked_at: None,
        };

        Self {
            access_token,
            refresh_token,
            access,
            refresh,
        }
    }

    async fn insert(&self, guard: &mut SqliteTransactionGuard<'_>) -> AppResult<()> {
        Database::insert_access_token(guard, &self.access).await?;
        Database::insert_refresh_token(guard, &self.refresh).await
    }

    fn into_response(self, user: Option<UserClaims>) -> TokenResponse {
        TokenResponse {
            access_token: self.access_token,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            expires_in: ACCESS_TOKEN_TTL_SECS,
            refresh_token: self.refresh_token,
            scope: self.access.scope,
            user,
        }
    }
}

/// Token endpoint implementation
#[derive(Clone)]
pub struct TokenIssuer {
    database: Arc<Database>,
    clients: ClientRegistry,
    identities: Arc<dyn IdentityResolver>,
}

impl TokenIssuer {
    /// Creates a new token issuer
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        clients: ClientRegistry,
        identities: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            database,
            clients,
            identities,
        }
    }

    /// Handle a token request (POST /oauth2/token)
    ///
    /// # Errors
    /// Returns `invalid_client` (401), `invalid_request`, `invalid_grant`,
    /// `unsupported_grant_type`, or `server_error`
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        let client_id = request
            .client_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("Missing client_id"))?;
        let client = self.clients.resolve_active(&client_id).await?;

        match TokenGrant::parse(request)? {
            TokenGrant::AuthorizationCode(grant) => {
                self.exchange_authorization_code(&client, grant).await
            }
            TokenGrant::RefreshToken(grant) => self.rotate_refresh_token(&client, grant).await,
        }
    }

    /// Exchange a code for a token pair
    ///
    /// Every check that can fail without consuming the code runs first, so a
    /// wrong verifier or an identity outage leaves the code redeemable.
    async fn exchange_authorization_code(
        &self,
        client: &OAuth2Client,
        grant: AuthorizationCodeGrant,
    ) -> Result<TokenResponse, OAuth2Error> {
        let client_id = client.client_id.as_str();
        let code_hash = hash_secret(&grant.code);
        let now = Utc::now();

        let Some(code) = self
            .database
            .get_unused_authorization_code(&code_hash, client_id)
            .await?
        else {
            warn!(client_id = %client_id, "Authorization code unknown, already used, or issued to another client");
            return Err(OAuth2Error::invalid_grant(
                "Invalid or expired authorization code",
            ));
        };

        if now > code.expires_at {
            warn!(client_id = %client_id, "Authorization code has expired");
            return Err(OAuth2Error::invalid_grant("Authorization code has expired"));
        }

        if code.redirect_uri != grant.redirect_uri {
            warn!(client_id = %client_id, "Redirect URI mismatch on code exchange");
            return Err(OAuth2Error::invalid_grant("Redirect URI mismatch"));
        }

        Self::verify_pkce(&code, grant.code_verifier.as_deref())?;

        let scope = ScopeSet::parse(&code.scope);
        let user = resolve_claims(self.identities.as_ref(), code.user_id, &scope).await?;

        let mut guard = self.database.begin().await?;
        if !Database::mark_authorization_code_used(&mut guard, &code_hash, client_id, now).await? {
            warn!(client_id = %client_id, "Authorization code replay lost the consumption race");
            return Err(OAuth2Error::invalid_grant(
                "Invalid or expired authorization code",
            ));
        }
        let pair = IssuedPair::mint(client_id, code.user_id, &code.scope, now);
        pair.insert(&mut guard).await?;
        guard.commit().await?;

        info!(client_id = %client_id, user_id = %code.user_id, "Authorization code exchanged");
        Ok(pair.into_response(Some(user)))
    }

    fn verify_pkce(
        code: &OAuth2AuthorizationCode,
        verifier: Option<&str>,
    ) -> Result<(), OAuth2Error> {
        let Some(challenge) = code.code_challenge.as_deref() else {
            return Ok(());
        };
        let Some(verifier) = verifier else {
            warn!(client_id = %code.client_id, "PKCE verifier missing for challenged code");
            return Err(OAuth2Error::invalid_request("Missing code_verifier"));
        };
        let Some(method) = PkceMethod::parse(&code.code_challenge_method) else {
            error!(
                client_id = %code.client_id,
                method = %code.code_challenge_method,
                "Stored code carries an unsupported PKCE method"
            );
            return Err(OAuth2Error::invalid_grant(
                "Unsupported code_challenge_method",
            ));
        };

        if method.verify(verifier, challenge) {
            Ok(())
        } else {
            warn!(client_id = %code.client_id, method = %method, "PKCE verification failed");
            Err(OAuth2Error::invalid_grant("Invalid code_verifier"))
        }
    }

    /// Revoke a refresh token and its access token, and issue a fresh pair
    ///
    /// All writes share one transaction; on any failure the old pair stays valid.
    async fn rotate_refresh_token(
        &self,
        client: &OAuth2Client,
        grant: RefreshTokenGrant,
    ) -> Result<TokenResponse, OAuth2Error> {
        let client_id = client.client_id.as_str();
        let token_hash = hash_secret(&grant.refresh_token);
        let now = Utc::now();

        let Some(refresh) = self
            .database
            .get_active_refresh_token(&token_hash, client_id)
            .await?
        else {
            warn!(client_id = %client_id, "Refresh token unknown, revoked, or issued to another client");
            return Err(OAuth2Error::invalid_grant("Invalid refresh token"));
        };

        if now > refresh.expires_at {
            warn!(client_id = %client_id, "Refresh token has expired");
            return Err(OAuth2Error::invalid_grant("Refresh token has expired"));
        }

        let mut guard = self.database.begin().await?;
        if !Database::revoke_refresh_token(&mut guard, refresh.id, now).await? {
            warn!(client_id = %client_id, "Refresh token replay lost the rotation race");
            return Err(OAuth2Error::invalid_grant("Invalid refresh token"));
        }
        Database::revoke_access_token(&mut guard, refresh.access_token_id, now).await?;
        let pair = IssuedPair::mint(client_id, refresh.user_id, &refresh.scope, now);
        pair.insert(&mut guard).await?;
        guard.commit().await?;

        info!(client_id = %client_id, user_id = %refresh.user_id, "Refresh token rotated");
        Ok(pair.into_response(None))
    }
}
