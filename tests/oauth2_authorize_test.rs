// ABOUTME: Integration tests for the authorization decision and the consent hand-off
// ABOUTME: Covers silent issuance, login redirects, pre- and post-redirect errors and consent upserts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use alsamos_accounts::oauth2_server::{
    AuthorizeOutcome, AuthorizeRequest, IssueCodeRequest, OAuth2ErrorCode, ScopeSet,
};
use axum::http::StatusCode;
use common::{
    query_param, setup_test_environment, without_query, TEST_CLIENT_ID, TEST_LOGIN_URL,
    TEST_REDIRECT_URI,
};

fn authorize_request(scope: &str) -> AuthorizeRequest {
    AuthorizeRequest {
        response_type: Some("code".to_owned()),
        client_id: Some(TEST_CLIENT_ID.to_owned()),
        redirect_uri: Some(TEST_REDIRECT_URI.to_owned()),
        scope: Some(scope.to_owned()),
        state: Some("xyz".to_owned()),
        code_challenge: None,
        code_challenge_method: None,
        mode: None,
    }
}

fn consent_request(scope: &str, granted: bool) -> IssueCodeRequest {
    IssueCodeRequest {
        client_id: Some(TEST_CLIENT_ID.to_owned()),
        redirect_uri: Some(TEST_REDIRECT_URI.to_owned()),
        scope: Some(scope.to_owned()),
        state: Some("xyz".to_owned()),
        code_challenge: None,
        code_challenge_method: None,
        consent_granted: granted,
    }
}

#[tokio::test]
async fn test_anonymous_caller_is_sent_to_login_with_all_parameters() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid email");
    request.code_challenge = Some("challenge-value".to_owned());
    request.code_challenge_method = Some("S256".to_owned());

    let outcome = env.server.authorize(&request, None).await.unwrap();
    let AuthorizeOutcome::LoginRequired { login_url } = outcome else {
        panic!("expected a login redirect, got {outcome:?}");
    };

    assert_eq!(without_query(&login_url), TEST_LOGIN_URL);
    assert_eq!(query_param(&login_url, "client_id").as_deref(), Some(TEST_CLIENT_ID));
    assert_eq!(
        query_param(&login_url, "redirect_uri").as_deref(),
        Some(TEST_REDIRECT_URI)
    );
    assert_eq!(query_param(&login_url, "scope").as_deref(), Some("openid email"));
    assert_eq!(query_param(&login_url, "state").as_deref(), Some("xyz"));
    assert_eq!(query_param(&login_url, "response_type").as_deref(), Some("code"));
    assert_eq!(
        query_param(&login_url, "code_challenge").as_deref(),
        Some("challenge-value")
    );
    assert_eq!(
        query_param(&login_url, "code_challenge_method").as_deref(),
        Some("S256")
    );
    assert_eq!(query_param(&login_url, "mode").as_deref(), Some("login"));
    assert_eq!(query_param(&login_url, "client_name").as_deref(), Some("Mail"));
}

#[tokio::test]
async fn test_signup_mode_is_forwarded() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid");
    request.mode = Some("signup".to_owned());

    let outcome = env.server.authorize(&request, None).await.unwrap();
    assert_eq!(query_param(outcome.location(), "mode").as_deref(), Some("signup"));
    assert!(query_param(outcome.location(), "code_challenge").is_none());
}

#[tokio::test]
async fn test_logged_in_caller_without_consent_is_sent_to_login() {
    let env = setup_test_environment().await.unwrap();

    let outcome = env
        .server
        .authorize(&authorize_request("openid email"), Some(env.user.id))
        .await
        .unwrap();
    assert!(matches!(outcome, AuthorizeOutcome::LoginRequired { .. }));
}

#[tokio::test]
async fn test_covering_consent_issues_code_silently() {
    let env = setup_test_environment().await.unwrap();
    env.server
        .issue_code(&consent_request("openid email profile", true), env.user.id)
        .await
        .unwrap();

    let outcome = env
        .server
        .authorize(&authorize_request("openid email"), Some(env.user.id))
        .await
        .unwrap();
    let AuthorizeOutcome::CodeIssued { redirect_url } = outcome else {
        panic!("expected silent issuance, got {outcome:?}");
    };

    assert_eq!(without_query(&redirect_url), TEST_REDIRECT_URI);
    assert_eq!(query_param(&redirect_url, "state").as_deref(), Some("xyz"));
    let code = query_param(&redirect_url, "code").unwrap();
    assert!(code.len() >= 43, "code carries at least 256 bits");
}

#[tokio::test]
async fn test_consent_that_does_not_cover_request_requires_login() {
    let env = setup_test_environment().await.unwrap();
    env.server
        .issue_code(&consent_request("openid", true), env.user.id)
        .await
        .unwrap();

    let outcome = env
        .server
        .authorize(&authorize_request("openid email"), Some(env.user.id))
        .await
        .unwrap();
    assert!(matches!(outcome, AuthorizeOutcome::LoginRequired { .. }));
}

#[tokio::test]
async fn test_revoked_consent_no_longer_covers() {
    let env = setup_test_environment().await.unwrap();
    env.server
        .issue_code(&consent_request("openid email", true), env.user.id)
        .await
        .unwrap();
    assert!(env
        .server
        .revoke_consent(env.user.id, TEST_CLIENT_ID)
        .await
        .unwrap());

    let outcome = env
        .server
        .authorize(&authorize_request("openid"), Some(env.user.id))
        .await
        .unwrap();
    assert!(matches!(outcome, AuthorizeOutcome::LoginRequired { .. }));
}

#[tokio::test]
async fn test_unsupported_response_type() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid");
    request.response_type = Some("token".to_owned());

    let err = env.server.authorize(&request, None).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::UnsupportedResponseType);
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_state_is_rejected_without_redirect() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid");
    request.state = None;

    let err = env.server.authorize(&request, None).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidRequest);
    assert_eq!(
        err.error_description,
        "Missing required parameters: client_id, redirect_uri, state"
    );
}

#[tokio::test]
async fn test_unknown_client_is_400() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid");
    request.client_id = Some("nobody.example".to_owned());

    let err = env.server.authorize(&request, None).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidClient);
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inactive_client_is_rejected() {
    let env = setup_test_environment().await.unwrap();
    env.database
        .set_oauth2_client_active(TEST_CLIENT_ID, false)
        .await
        .unwrap();

    let err = env
        .server
        .authorize(&authorize_request("openid"), None)
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidClient);
}

#[tokio::test]
async fn test_unregistered_redirect_is_never_followed() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid");
    request.redirect_uri = Some("https://evil.example/cb".to_owned());

    let err = env.server.authorize(&request, None).await.unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidRequest);
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redirect_match_is_exact() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid");
    request.redirect_uri = Some(format!("{TEST_REDIRECT_URI}/"));

    assert!(env.server.authorize(&request, None).await.is_err());
}

#[tokio::test]
async fn test_disallowed_scope_travels_back_through_redirect() {
    let env = setup_test_environment().await.unwrap();

    let outcome = env
        .server
        .authorize(&authorize_request("openid admin"), None)
        .await
        .unwrap();
    let AuthorizeOutcome::ErrorRedirect { redirect_url } = outcome else {
        panic!("expected an error redirect, got {outcome:?}");
    };

    assert_eq!(without_query(&redirect_url), TEST_REDIRECT_URI);
    assert_eq!(query_param(&redirect_url, "error").as_deref(), Some("invalid_scope"));
    assert_eq!(query_param(&redirect_url, "state").as_deref(), Some("xyz"));
    assert!(query_param(&redirect_url, "code").is_none());
}

#[tokio::test]
async fn test_unsupported_pkce_method_travels_back_through_redirect() {
    let env = setup_test_environment().await.unwrap();
    let mut request = authorize_request("openid");
    request.code_challenge = Some("abc".to_owned());
    request.code_challenge_method = Some("RS256".to_owned());

    let outcome = env.server.authorize(&request, None).await.unwrap();
    assert!(matches!(outcome, AuthorizeOutcome::ErrorRedirect { .. }));
    assert_eq!(
        query_param(outcome.location(), "error").as_deref(),
        Some("invalid_request")
    );
}

#[tokio::test]
async fn test_blank_scope_uses_default_scope() {
    let env = setup_test_environment().await.unwrap();

    let outcome = env
        .server
        .authorize(&authorize_request(""), None)
        .await
        .unwrap();
    assert_eq!(
        query_param(outcome.location(), "scope").as_deref(),
        Some("openid profile email")
    );
}

#[tokio::test]
async fn test_consent_grant_records_consent_and_returns_code() {
    let env = setup_test_environment().await.unwrap();

    let response = env
        .server
        .issue_code(&consent_request("openid email", true), env.user.id)
        .await
        .unwrap();
    assert_eq!(without_query(&response.redirect_url), TEST_REDIRECT_URI);
    assert!(query_param(&response.redirect_url, "code").is_some());
    assert_eq!(
        query_param(&response.redirect_url, "state").as_deref(),
        Some("xyz")
    );

    let consent = env
        .database
        .get_active_consent(env.user.id, TEST_CLIENT_ID)
        .await
        .unwrap()
        .expect("consent recorded");
    assert_eq!(consent.scope, "openid email");
}

#[tokio::test]
async fn test_second_grant_replaces_consent_scope() {
    let env = setup_test_environment().await.unwrap();
    env.server
        .issue_code(&consent_request("openid", true), env.user.id)
        .await
        .unwrap();
    env.server
        .issue_code(&consent_request("openid email profile", true), env.user.id)
        .await
        .unwrap();

    let consent = env
        .database
        .get_active_consent(env.user.id, TEST_CLIENT_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        ScopeSet::parse(&consent.scope),
        ScopeSet::parse("openid email profile")
    );
}

#[tokio::test]
async fn test_denial_redirects_with_access_denied() {
    let env = setup_test_environment().await.unwrap();

    let response = env
        .server
        .issue_code(&consent_request("openid", false), env.user.id)
        .await
        .unwrap();
    assert_eq!(
        query_param(&response.redirect_url, "error").as_deref(),
        Some("access_denied")
    );
    assert_eq!(
        query_param(&response.redirect_url, "state").as_deref(),
        Some("xyz")
    );
    assert!(query_param(&response.redirect_url, "code").is_none());
    assert!(env
        .database
        .get_active_consent(env.user.id, TEST_CLIENT_ID)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_consent_for_disallowed_scope_is_not_recorded() {
    let env = setup_test_environment().await.unwrap();

    let response = env
        .server
        .issue_code(&consent_request("openid admin", true), env.user.id)
        .await
        .unwrap();
    assert_eq!(
        query_param(&response.redirect_url, "error").as_deref(),
        Some("invalid_scope")
    );
    assert!(env
        .database
        .get_active_consent(env.user.id, TEST_CLIENT_ID)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_consent_with_unregistered_redirect_is_rejected() {
    let env = setup_test_environment().await.unwrap();
    let mut request = consent_request("openid", true);
    request.redirect_uri = Some("https://evil.example/cb".to_owned());

    let err = env
        .server
        .issue_code(&request, env.user.id)
        .await
        .unwrap_err();
    assert_eq!(err.error, OAuth2ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn test_consent_without_state_issues_no_code() {
    let env = setup_test_environment().await.unwrap();

    for state in [None, Some(String::new())] {
        let mut request = consent_request("openid", true);
        request.state = state;

        let err = env
            .server
            .issue_code(&request, env.user.id)
            .await
            .unwrap_err();
        assert_eq!(err.error, OAuth2ErrorCode::InvalidRequest);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.error_description,
            "Missing required parameters: client_id, redirect_uri, state"
        );
    }

    let codes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM oauth2_authorization_codes")
        .fetch_one(env.database.pool())
        .await
        .unwrap();
    assert_eq!(codes, 0);
    assert!(env
        .database
        .get_active_consent(env.user.id, TEST_CLIENT_ID)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_registry_rejects_client_without_redirects() {
    let env = setup_test_environment().await.unwrap();
    assert!(env
        .server
        .clients()
        .register("empty.example", "Empty", Vec::new(), &ScopeSet::parse("openid"))
        .await
        .is_err());
}
