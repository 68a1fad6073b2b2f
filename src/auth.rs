// ABOUTME: Verification of the session credential issued by the login surface
// ABOUTME: HS256 JWTs carrying the caller's user id, shared secret with the login collaborator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session Authentication
//!
//! The interactive login surface authenticates users and hands the browser a
//! short-lived session credential. The authorization server only verifies
//! it: a valid credential identifies the caller on `/oauth2/authorize`
//! (enabling silent issuance) and is required on `/oauth2/issue-code`.

use crate::errors::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Claims carried by a session credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Why a session credential was rejected
#[derive(Debug, Error)]
pub enum SessionError {
    /// Past its `exp`
    #[error("Session credential has expired")]
    Expired,
    /// Bad signature, algorithm or structure
    #[error("Session credential is invalid: {reason}")]
    Invalid {
        /// Reason for invalidity
        reason: String,
    },
    /// `sub` is not a user id
    #[error("Session credential subject is not a valid user id")]
    MalformedSubject,
}

/// Verifies (and, for development tooling, mints) session credentials
#[derive(Clone)]
pub struct SessionAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionAuthenticator {
    /// Creates an authenticator over the secret shared with the login surface
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify a credential and return the caller's user id
    ///
    /// # Errors
    /// Returns a [`SessionError`] describing why the credential was rejected
    pub fn verify(&self, token: &str) -> Result<Uuid, SessionError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| Self::convert_jwt_error(&e))?;

        let user_id =
            Uuid::parse_str(&data.claims.sub).map_err(|_| SessionError::MalformedSubject)?;
        debug!(user_id = %user_id, "Session credential verified");
        Ok(user_id)
    }

    /// Mint a credential; the login surface does this in production
    ///
    /// # Errors
    /// Returns an error if signing fails
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session credential: {e}")))
    }

    fn convert_jwt_error(e: &JwtError) -> SessionError {
        match e.kind() {
            ErrorKind::ExpiredSignature => {
                debug!("Session credential expired");
                SessionError::Expired
            }
            ErrorKind::InvalidSignature => {
                warn!("Session credential signature verification failed");
                SessionError::Invalid {
                    reason: "signature verification failed".into(),
                }
            }
            _ => {
                warn!("Session credential rejected: {e}");
                SessionError::Invalid {
                    reason: e.to_string(),
                }
            }
        }
    }
}
