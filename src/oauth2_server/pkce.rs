// ABOUTME: PKCE (RFC 7636) challenge methods and verifier checks
// ABOUTME: S256 and plain, both compared in constant time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use accounts_core::constants::oauth::{PKCE_METHOD_PLAIN, PKCE_METHOD_S256};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Result as FmtResult};
use subtle::ConstantTimeEq;

/// PKCE code challenge method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkceMethod {
    /// Challenge equals the verifier
    Plain,
    /// Challenge is `BASE64URL-NOPAD(SHA256(verifier))`
    S256,
}

impl PkceMethod {
    /// Parse a method identifier; anything but `plain` and `S256` is unsupported
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            PKCE_METHOD_PLAIN => Some(Self::Plain),
            PKCE_METHOD_S256 => Some(Self::S256),
            _ => None,
        }
    }

    /// Resolve an optional method, defaulting to `S256`
    #[must_use]
    pub fn parse_or_default(method: Option<&str>) -> Option<Self> {
        method.map_or(Some(Self::S256), Self::parse)
    }

    /// Returns the string representation for OAuth requests
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => PKCE_METHOD_PLAIN,
            Self::S256 => PKCE_METHOD_S256,
        }
    }

    /// Whether `verifier` satisfies `challenge` under this method
    #[must_use]
    pub fn verify(self, verifier: &str, challenge: &str) -> bool {
        let computed = match self {
            Self::Plain => verifier.to_owned(),
            Self::S256 => s256_challenge(verifier),
        };
        computed.as_bytes().ct_eq(challenge.as_bytes()).into()
    }
}

impl Display for PkceMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Compute the S256 challenge for a verifier
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
