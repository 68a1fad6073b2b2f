// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses listener, database, login surface and session secret settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use anyhow::{anyhow, Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use tracing::{info, warn};
use url::Url;

/// Default login surface base URL
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.alsamos.com";

/// Default database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/accounts.db";

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Session credential settings shared with the login surface
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret used to verify session credentials
    pub session_jwt_secret: Vec<u8>,
    /// Whether the secret was generated for this process only
    pub generated_secret: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_jwt_secret", &"[REDACTED]")
            .field("generated_secret", &self.generated_secret)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listener address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// sqlx database URL
    pub database_url: String,
    /// Base URL of the interactive login/consent surface
    pub accounts_url: String,
    /// Issuer identifier advertised in discovery metadata
    pub issuer_url: String,
    /// Session credential settings
    pub auth: AuthConfig,
    /// Comma-separated CORS origins, `*` for any
    pub cors_allowed_origins: String,
    /// Deployment environment
    pub environment: Environment,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a value is malformed or production is missing its session secret
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// # Errors
    /// Returns an error if a value is malformed or production is missing its session secret
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let environment = Environment::from_str_or_default(&var_or("ENVIRONMENT", "development"));
        let host = var_or("HOST", "0.0.0.0");
        let http_port = var_or("HTTP_PORT", "8080")
            .parse::<u16>()
            .context("Invalid HTTP_PORT value")?;

        let accounts_url = trim_trailing_slash(&var_or("ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL));
        let issuer_url = lookup("ISSUER_URL").map_or_else(
            || format!("http://{host}:{http_port}"),
            |url| trim_trailing_slash(&url),
        );

        let auth = match lookup("SESSION_JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => AuthConfig {
                session_jwt_secret: secret.into_bytes(),
                generated_secret: false,
            },
            None if environment.is_production() => {
                return Err(anyhow!(
                    "SESSION_JWT_SECRET must be set when ENVIRONMENT=production"
                ));
            }
            None => {
                warn!("SESSION_JWT_SECRET not set, generating a development-only secret");
                AuthConfig {
                    session_jwt_secret: generate_development_secret(),
                    generated_secret: true,
                }
            }
        };

        let config = Self {
            host,
            http_port,
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            accounts_url,
            issuer_url,
            auth,
            cors_allowed_origins: var_or("CORS_ALLOWED_ORIGINS", "*"),
            environment,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    /// Returns an error if a URL setting is not absolute
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("ACCOUNTS_URL", &self.accounts_url),
            ("ISSUER_URL", &self.issuer_url),
        ] {
            Url::parse(value).with_context(|| format!("{name} must be an absolute URL"))?;
        }
        if !self.database_url.starts_with("sqlite:") {
            return Err(anyhow!("DATABASE_URL must be a sqlite: URL"));
        }
        Ok(())
    }

    /// URL of the interactive login/consent surface
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/authorize", self.accounts_url)
    }

    /// Socket address string for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// One-line summary safe to log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} listen={} database={} accounts_url={} issuer={} session_secret={}",
            self.environment,
            self.bind_address(),
            self.database_url,
            self.accounts_url,
            self.issuer_url,
            if self.auth.generated_secret {
                "generated"
            } else {
                "configured"
            }
        )
    }
}

fn trim_trailing_slash(value: &str) -> String {
    value.trim_end_matches('/').to_owned()
}

fn generate_development_secret() -> Vec<u8> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes).into_bytes()
}
