// ABOUTME: OAuth 2.0 authorization server with PKCE, consent tracking and refresh rotation
// ABOUTME: Opaque server-side tokens; codes single-use; rotation transactional
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Authorization endpoint decision engine
pub mod authorization;
/// Scope-filtered user claims
pub mod claims;
/// Client registry lookups and validation
pub mod client_registry;
/// Authorization code issuance and consent decisions
pub mod code_issuer;
/// Consent persistence and coverage
pub mod consent;
/// Server facade used by the HTTP layer
pub mod endpoints;
/// Access token introspection
pub mod introspection;
/// OAuth 2.0 data models and types
pub mod models;
/// PKCE challenge methods
pub mod pkce;
/// Redirect URL construction
pub mod redirect;
/// Scope sets
pub mod scopes;
/// Code and token generation and hashing
pub mod secrets;
/// Token endpoint grants
pub mod token_issuer;

pub use authorization::{AuthorizationEngine, AuthorizeOutcome};
pub use claims::UserClaims;
pub use client_registry::ClientRegistry;
pub use code_issuer::CodeIssuer;
pub use consent::ConsentStore;
pub use endpoints::OAuth2AuthorizationServer;
pub use introspection::TokenIntrospector;

/// Authorization request
pub use models::AuthorizeRequest;
/// Introspection response
pub use models::IntrospectionResponse;
/// Consent decision request
pub use models::IssueCodeRequest;
/// Consent decision response
pub use models::IssueCodeResponse;
/// OAuth 2.0 error response
pub use models::OAuth2Error;
/// OAuth 2.0 error codes
pub use models::OAuth2ErrorCode;
/// Token exchange request
pub use models::TokenRequest;
/// Token exchange response
pub use models::TokenResponse;

pub use pkce::PkceMethod;
pub use scopes::ScopeSet;
pub use token_issuer::{TokenGrant, TokenIssuer};
