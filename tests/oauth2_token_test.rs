// ABOUTME: Integration tests for the token endpoint grants
// ABOUTME: Code exchange, PKCE binding, single use, expiry and refresh token rotation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use accounts_core::models::{
    OAuth2AccessToken, OAuth2AuthorizationCode, OAuth2RefreshToken, UserIdentity,
};
use alsamos_accounts::errors::{AppError, AppResult};
use alsamos_accounts::identity::IdentityResolver;
use alsamos_accounts::oauth2_server::pkce::s256_challenge;
use alsamos_accounts::oauth2_server::secrets::hash_secret;
use alsamos_accounts::oauth2_server::{
    OAuth2AuthorizationServer, OAuth2ErrorCode, ScopeSet, TokenRequest,
};
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    code_exchange_request, issue_code, refresh_request, setup_test_environment, store_token_pair,
    TEST_CLIENT_ID, TEST_LOGIN_URL, TEST_REDIRECT_URI,
};
use std::sync::Arc;
use uuid::Uuid;

const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

#[tokio::test]
async fn test_code_exchange_returns_pair_and_filtered_user() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid email", None).await;

    let response = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap();

    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 3600);
    assert_eq!(response.scope, "openid email");
    assert_eq!(response.access_token.len(), 64);
    assert_eq!(response.refresh_token.len(), 64);
    assert_ne!(response.access_token, response.refresh_token);

    let user = response.user.expect("code exchange carries the user");
    assert_eq!(user.id, env.user.id);
    assert!(user.email_verified);
    assert_eq!(user.email.as_deref(), Some(env.user.email.as_str()));
    assert!(user.name.is_none(), "name requires the profile scope");
    assert!(user.avatar_url.is_none(), "avatar requires the profile scope");
}

#[tokio::test]
async fn test_profile_scope_releases_name_and_avatar() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid profile", None).await;

    let user = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap()
        .user
        .unwrap();
    assert!(user.email.is_none());
    assert_eq!(user.name, env.user.name);
    assert_eq!(user.avatar_url, env.user.avatar_url);
}

#[tokio::test]
async fn test_code_is_single_use() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid", None).await;

    env.server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap();
    let err = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap_err();

    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_code_is_invalid_grant() {
    let env = setup_test_environment().await.unwrap();

    let err = env
        .server
        .token(code_exchange_request("no-such-code", None))
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);
    assert_eq!(err.error_description, "Invalid or expired authorization code");
}

#[tokio::test]
async fn test_s256_verifier_is_accepted() {
    let env = setup_test_environment().await.unwrap();
    let challenge = s256_challenge(VERIFIER);
    let code = issue_code(&env, "openid", Some((challenge.as_str(), "S256"))).await;

    let response = env
        .server
        .token(code_exchange_request(&code, Some(VERIFIER)))
        .await
        .unwrap();
    assert!(!response.access_token.is_empty());
}

#[tokio::test]
async fn test_plain_verifier_is_accepted() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid", Some((VERIFIER, "plain"))).await;

    assert!(env
        .server
        .token(code_exchange_request(&code, Some(VERIFIER)))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_wrong_verifier_does_not_burn_the_code() {
    let env = setup_test_environment().await.unwrap();
    let challenge = s256_challenge(VERIFIER);
    let code = issue_code(&env, "openid", Some((challenge.as_str(), "S256"))).await;

    let err = env
        .server
        .token(code_exchange_request(&code, Some("wrong-verifier")))
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);
    assert_eq!(err.error_description, "Invalid code_verifier");

    assert!(env
        .server
        .token(code_exchange_request(&code, Some(VERIFIER)))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_missing_verifier_for_challenged_code() {
    let env = setup_test_environment().await.unwrap();
    let challenge = s256_challenge(VERIFIER);
    let code = issue_code(&env, "openid", Some((challenge.as_str(), "S256"))).await;

    let err = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap_err();
    assert_eq!(err.error_description, "Missing code_verifier");

    assert!(env
        .server
        .token(code_exchange_request(&code, Some(VERIFIER)))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_redirect_must_match_the_issued_code() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid", None).await;
    let mut request = code_exchange_request(&code, None);
    request.redirect_uri = Some("https://mail.example/other".to_owned());

    let err = env.server.token(request).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);
    assert_eq!(err.error_description, "Redirect URI mismatch");
}

#[tokio::test]
async fn test_code_is_bound_to_its_client() {
    let env = setup_test_environment().await.unwrap();
    env.server
        .clients()
        .register(
            "calendar.example",
            "Calendar",
            vec![TEST_REDIRECT_URI.to_owned()],
            &ScopeSet::parse("openid"),
        )
        .await
        .unwrap();
    let code = issue_code(&env, "openid", None).await;
    let mut request = code_exchange_request(&code, None);
    request.client_id = Some("calendar.example".to_owned());

    let err = env.server.token(request).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);

    assert!(env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let env = setup_test_environment().await.unwrap();
    let issued = Utc::now() - Duration::minutes(11);
    env.database
        .store_authorization_code(&OAuth2AuthorizationCode {
            code_hash: hash_secret("stale-code"),
            client_id: TEST_CLIENT_ID.to_owned(),
            user_id: env.user.id,
            redirect_uri: TEST_REDIRECT_URI.to_owned(),
            scope: "openid".to_owned(),
            code_challenge: None,
            code_challenge_method: "S256".to_owned(),
            created_at: issued,
            expires_at: issued + Duration::minutes(10),
            used_at: None,
        })
        .await
        .unwrap();

    let err = env
        .server
        .token(code_exchange_request("stale-code", None))
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);
    assert_eq!(err.error_description, "Authorization code has expired");
}

#[tokio::test]
async fn test_unknown_client_is_401() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid", None).await;
    let mut request = code_exchange_request(&code, None);
    request.client_id = Some("nobody.example".to_owned());

    let err = env.server.token(request).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidClient);
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_client_id() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid", None).await;
    let mut request = code_exchange_request(&code, None);
    request.client_id = None;

    let err = env.server.token(request).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidRequest);
    assert_eq!(err.error_description, "Missing client_id");
}

#[tokio::test]
async fn test_unsupported_grant_type() {
    let env = setup_test_environment().await.unwrap();
    let request = TokenRequest {
        grant_type: Some("client_credentials".to_owned()),
        client_id: Some(TEST_CLIENT_ID.to_owned()),
        ..TokenRequest::default()
    };

    let err = env.server.token(request).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::UnsupportedGrantType);
}

#[tokio::test]
async fn test_refresh_rotates_the_pair() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid email", None).await;
    let first = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap();

    let second = env
        .server
        .token(refresh_request(&first.refresh_token))
        .await
        .unwrap();
    assert_ne!(second.access_token, first.access_token);
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(second.scope, "openid email");
    assert!(second.user.is_none());

    let replay = env
        .server
        .token(refresh_request(&first.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(replay.error, OAuth2ErrorCode::InvalidGrant);
    assert_eq!(replay.error_description, "Invalid refresh token");

    let old_access = env
        .server
        .introspect(Some(&first.access_token))
        .await
        .unwrap_err();
    assert_eq!(old_access.error, OAuth2ErrorCode::InvalidToken);
    assert!(env
        .server
        .introspect(Some(&second.access_token))
        .await
        .is_ok());

    assert!(env
        .server
        .token(refresh_request(&second.refresh_token))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_refresh_token_is_bound_to_its_client() {
    let env = setup_test_environment().await.unwrap();
    env.server
        .clients()
        .register(
            "calendar.example",
            "Calendar",
            vec!["https://calendar.example/cb".to_owned()],
            &ScopeSet::parse("openid"),
        )
        .await
        .unwrap();
    let code = issue_code(&env, "openid", None).await;
    let pair = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap();

    let mut request = refresh_request(&pair.refresh_token);
    request.client_id = Some("calendar.example".to_owned());
    let err = env.server.token(request).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);

    assert!(env
        .server
        .token(refresh_request(&pair.refresh_token))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected() {
    let env = setup_test_environment().await.unwrap();
    let issued = Utc::now() - Duration::days(31);
    let access = OAuth2AccessToken {
        id: Uuid::new_v4(),
        token_hash: hash_secret("stale-access"),
        client_id: TEST_CLIENT_ID.to_owned(),
        user_id: env.user.id,
        scope: "openid".to_owned(),
        created_at: issued,
        expires_at: issued + Duration::hours(1),
        revoked_at: None,
    };
    let refresh = OAuth2RefreshToken {
        id: Uuid::new_v4(),
        token_hash: hash_secret("stale-refresh"),
        access_token_id: access.id,
        client_id: TEST_CLIENT_ID.to_owned(),
        user_id: env.user.id,
        scope: "openid".to_owned(),
        created_at: issued,
        expires_at: issued + Duration::days(30),
        revoked_at: None,
    };
    store_token_pair(&env.database, &access, &refresh).await;

    let err = env
        .server
        .token(refresh_request("stale-refresh"))
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidGrant);
    assert_eq!(err.error_description, "Refresh token has expired");
}

#[tokio::test]
async fn test_missing_refresh_token() {
    let env = setup_test_environment().await.unwrap();
    let request = TokenRequest {
        grant_type: Some("refresh_token".to_owned()),
        client_id: Some(TEST_CLIENT_ID.to_owned()),
        ..TokenRequest::default()
    };

    let err = env.server.token(request).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidRequest);
    assert_eq!(err.error_description, "Missing refresh_token");
}

/// Identity collaborator that is down
struct UnreachableIdentities;

#[async_trait]
impl IdentityResolver for UnreachableIdentities {
    async fn resolve_identity(&self, _user_id: Uuid) -> AppResult<Option<UserIdentity>> {
        Err(AppError::database("connection refused by users-db.internal:5432"))
    }
}

#[tokio::test]
async fn test_identity_failure_is_server_error_and_keeps_the_code() {
    let env = setup_test_environment().await.unwrap();
    let degraded = OAuth2AuthorizationServer::new(
        env.database.clone(),
        Arc::new(UnreachableIdentities),
        TEST_LOGIN_URL.to_owned(),
    );
    let code = issue_code(&env, "openid email", None).await;

    let err = degraded
        .token(code_exchange_request(&code, None))
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::ServerError);
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.error_description, "Internal server error");

    let response = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap();
    assert_eq!(response.user.unwrap().id, env.user.id);
}

#[tokio::test]
async fn test_failed_rotation_leaves_the_old_pair_usable() {
    let env = setup_test_environment().await.unwrap();
    let code = issue_code(&env, "openid", None).await;
    let pair = env
        .server
        .token(code_exchange_request(&code, None))
        .await
        .unwrap();

    // The new access token lands, then the refresh insert fails
    sqlx::query(
        "CREATE TRIGGER reject_refresh BEFORE INSERT ON oauth2_refresh_tokens \
         BEGIN SELECT RAISE(ABORT, 'refresh insert rejected'); END",
    )
    .execute(env.database.pool())
    .await
    .unwrap();

    let err = env
        .server
        .token(refresh_request(&pair.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::ServerError);
    assert!(!err.error_description.contains("rejected"));

    sqlx::query("DROP TRIGGER reject_refresh")
        .execute(env.database.pool())
        .await
        .unwrap();

    let tokens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM oauth2_access_tokens")
        .fetch_one(env.database.pool())
        .await
        .unwrap();
    assert_eq!(tokens, 1);
    assert!(env
        .server
        .introspect(Some(&pair.access_token))
        .await
        .is_ok());

    let rotated = env
        .server
        .token(refresh_request(&pair.refresh_token))
        .await
        .unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);
}
