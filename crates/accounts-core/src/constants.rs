// ABOUTME: Protocol constants for the authorization server
// ABOUTME: Token lifetimes, scope names, grant types and PKCE method identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Lifetimes of issued artifacts
pub mod lifetimes {
    /// Authorization codes live for 10 minutes
    pub const AUTHORIZATION_CODE_TTL_MINUTES: i64 = 10;

    /// Access tokens live for 1 hour
    pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

    /// Refresh tokens live for 30 days
    pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;
}

/// Scope identifiers understood by the claims filter
pub mod scopes {
    /// `OpenID` marker scope
    pub const OPENID: &str = "openid";

    /// Grants `name` and `avatar_url` in the user object
    pub const PROFILE: &str = "profile";

    /// Grants `email` in the user object
    pub const EMAIL: &str = "email";

    /// Scope requested when the relying party does not send one
    pub const DEFAULT_SCOPE: &str = "openid profile email";
}

/// OAuth 2.0 protocol identifiers
pub mod oauth {
    /// The only supported `response_type`
    pub const RESPONSE_TYPE_CODE: &str = "code";

    /// `grant_type` for code exchange
    pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";

    /// `grant_type` for refresh rotation
    pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

    /// Token type reported in token and introspection responses
    pub const TOKEN_TYPE_BEARER: &str = "Bearer";

    /// PKCE plain method
    pub const PKCE_METHOD_PLAIN: &str = "plain";

    /// PKCE SHA-256 method, the default when a challenge arrives without a method
    pub const PKCE_METHOD_S256: &str = "S256";

    /// Interactive surface mode for returning users
    pub const MODE_LOGIN: &str = "login";

    /// Interactive surface mode for new users
    pub const MODE_SIGNUP: &str = "signup";
}

/// Sizes of generated secrets
pub mod secrets {
    /// Random bytes in an authorization code (256 bits)
    pub const AUTHORIZATION_CODE_BYTES: usize = 32;

    /// Random bytes in an access or refresh token (256 bits)
    pub const TOKEN_BYTES: usize = 32;
}
