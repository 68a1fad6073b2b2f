// ABOUTME: Error types used by the accounts server outside the OAuth2 protocol surface
// ABOUTME: Re-exports AppError and its ErrorCode kinds from accounts-core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Internal faults are [`AppError`] values; protocol failures seen by
//! relying parties are `OAuth2Error` values in the `oauth2_server` module.

pub use accounts_core::errors::{AppError, AppResult, ErrorBody, ErrorCode};
