// ABOUTME: Generation and hashing of authorization codes and bearer tokens
// ABOUTME: Only SHA-256 digests are persisted; plaintext lives in responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use accounts_core::constants::secrets::{AUTHORIZATION_CODE_BYTES, TOKEN_BYTES};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a URL-safe authorization code (256 bits)
#[must_use]
pub fn generate_authorization_code() -> String {
    let mut bytes = [0u8; AUTHORIZATION_CODE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a hex access or refresh token (256 bits)
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a code or token for storage and lookup
#[must_use]
pub fn hash_secret(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
