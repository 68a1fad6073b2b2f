// ABOUTME: Persistence models for the authorization server
// ABOUTME: Re-exports OAuth 2.0 records and the collaborator-owned user identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// OAuth 2.0 server records: clients, consents, codes, tokens
pub mod oauth2_server;

/// User identity as exposed by the login collaborator
pub mod user;

pub use oauth2_server::{
    OAuth2AccessToken, OAuth2AuthorizationCode, OAuth2Client, OAuth2Consent, OAuth2RefreshToken,
};
pub use user::UserIdentity;
