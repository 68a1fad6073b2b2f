// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory database, seeded client and user, and session credential helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `alsamos_accounts`

use accounts_core::models::{OAuth2AccessToken, OAuth2Client, OAuth2RefreshToken, UserIdentity};
use alsamos_accounts::{
    auth::SessionAuthenticator,
    config::ServerConfig,
    database::Database,
    oauth2_server::{
        ClientRegistry, IssueCodeRequest, OAuth2AuthorizationServer, ScopeSet, TokenRequest,
    },
    resources::ServerResources,
};
use anyhow::Result;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Once};
use tracing::Level;
use url::Url;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Relying party seeded by every environment
pub const TEST_CLIENT_ID: &str = "mail.example";
/// Its only registered redirect
pub const TEST_REDIRECT_URI: &str = "https://mail.example/cb";
/// Login surface used by the tests
pub const TEST_ACCOUNTS_URL: &str = "https://accounts.test";
/// Login surface authorize page
pub const TEST_LOGIN_URL: &str = "https://accounts.test/authorize";
/// Secret shared with the test login surface
pub const TEST_SESSION_SECRET: &str = "test-session-secret";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    Ok(Arc::new(Database::new("sqlite::memory:").await?))
}

/// Register the standard test client
pub async fn create_test_client(database: &Arc<Database>) -> Result<OAuth2Client> {
    let registry = ClientRegistry::new(database.clone());
    Ok(registry
        .register(
            TEST_CLIENT_ID,
            "Mail",
            vec![TEST_REDIRECT_URI.to_owned()],
            &ScopeSet::parse("openid email profile"),
        )
        .await?)
}

/// Create a verified user with a name and avatar
pub async fn create_test_user(database: &Database) -> Result<UserIdentity> {
    create_test_user_with_email(database, &format!("user-{}@example.com", Uuid::new_v4())).await
}

/// Create a verified user with the given email
pub async fn create_test_user_with_email(database: &Database, email: &str) -> Result<UserIdentity> {
    let user = UserIdentity {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        email_verified: true,
        name: Some("Ada Lovelace".to_owned()),
        avatar_url: Some("https://cdn.example.com/ada.png".to_owned()),
    };
    database.create_user(&user, Utc::now()).await?;
    Ok(user)
}

/// Everything the protocol-level tests need
pub struct TestEnvironment {
    pub database: Arc<Database>,
    pub server: OAuth2AuthorizationServer,
    pub client: OAuth2Client,
    pub user: UserIdentity,
}

/// Database with one client and one user, plus the server over it
pub async fn setup_test_environment() -> Result<TestEnvironment> {
    let database = create_test_database().await?;
    let client = create_test_client(&database).await?;
    let user = create_test_user(&database).await?;
    let server = OAuth2AuthorizationServer::new(
        database.clone(),
        database.clone(),
        TEST_LOGIN_URL.to_owned(),
    );

    Ok(TestEnvironment {
        database,
        server,
        client,
        user,
    })
}

/// Configuration pointing at the test login surface
pub fn create_test_config() -> ServerConfig {
    let vars: HashMap<&str, &str> = [
        ("ACCOUNTS_URL", TEST_ACCOUNTS_URL),
        ("ISSUER_URL", "https://auth.test"),
        ("SESSION_JWT_SECRET", TEST_SESSION_SECRET),
        ("DATABASE_URL", "sqlite::memory:"),
        ("ENVIRONMENT", "testing"),
    ]
    .into_iter()
    .collect();
    ServerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()))
        .expect("test configuration is valid")
}

/// Server resources over a seeded in-memory database
pub async fn create_test_server_resources() -> Result<(Arc<ServerResources>, UserIdentity)> {
    let database = create_test_database().await?;
    create_test_client(&database).await?;
    let user = create_test_user(&database).await?;
    let identities = database.clone();
    let resources =
        ServerResources::with_identity_resolver(database, identities, create_test_config());
    Ok((Arc::new(resources), user))
}

/// Session credential for a user, signed with the test secret
pub fn create_session_token(user_id: Uuid) -> String {
    SessionAuthenticator::new(TEST_SESSION_SECRET.as_bytes())
        .issue(user_id, Duration::minutes(15))
        .expect("session credential signs")
}

/// First value of a query parameter in a URL
pub fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// URL without its query string
pub fn without_query(url: &str) -> String {
    let mut parsed = Url::parse(url).expect("valid url");
    parsed.set_query(None);
    parsed.to_string()
}

/// Approve a consent for the test user and return the issued code
pub async fn issue_code(env: &TestEnvironment, scope: &str, challenge: Option<(&str, &str)>) -> String {
    let response = env
        .server
        .issue_code(
            &IssueCodeRequest {
                client_id: Some(TEST_CLIENT_ID.to_owned()),
                redirect_uri: Some(TEST_REDIRECT_URI.to_owned()),
                scope: Some(scope.to_owned()),
                state: Some("xyz".to_owned()),
                code_challenge: challenge.map(|(c, _)| c.to_owned()),
                code_challenge_method: challenge.map(|(_, m)| m.to_owned()),
                consent_granted: true,
            },
            env.user.id,
        )
        .await
        .expect("code issued");
    query_param(&response.redirect_url, "code").expect("redirect carries a code")
}

/// `authorization_code` grant for the test client
pub fn code_exchange_request(code: &str, verifier: Option<&str>) -> TokenRequest {
    TokenRequest {
        grant_type: Some("authorization_code".to_owned()),
        code: Some(code.to_owned()),
        redirect_uri: Some(TEST_REDIRECT_URI.to_owned()),
        client_id: Some(TEST_CLIENT_ID.to_owned()),
        code_verifier: verifier.map(str::to_owned),
        refresh_token: None,
    }
}

/// `refresh_token` grant for the test client
pub fn refresh_request(refresh_token: &str) -> TokenRequest {
    TokenRequest {
        grant_type: Some("refresh_token".to_owned()),
        client_id: Some(TEST_CLIENT_ID.to_owned()),
        refresh_token: Some(refresh_token.to_owned()),
        ..TokenRequest::default()
    }
}

/// Persist a pre-built token pair, for seeding expiry and rotation cases
pub async fn store_token_pair(
    database: &Database,
    access: &OAuth2AccessToken,
    refresh: &OAuth2RefreshToken,
) {
    let mut guard = database.begin().await.expect("transaction opens");
    Database::insert_access_token(&mut guard, access)
        .await
        .expect("access token stored");
    Database::insert_refresh_token(&mut guard, refresh)
        .await
        .expect("refresh token stored");
    guard.commit().await.expect("token pair committed");
}
