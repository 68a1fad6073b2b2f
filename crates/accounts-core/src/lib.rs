// ABOUTME: Core types and constants for the Alsamos accounts authorization server
// ABOUTME: Foundation crate with error handling, persistence models, and protocol constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Accounts Core
//!
//! Foundation crate providing shared types for the accounts OAuth 2.0
//! authorization server. It changes infrequently so the server crate can
//! recompile on its own.
//!
//! ## Modules
//!
//! - **errors**: Internal `AppError` with its `ErrorCode` kinds
//! - **constants**: Protocol lifetimes, scope names and grant identifiers
//! - **models**: Persistence records for clients, consents, codes and tokens

/// Internal error type and its HTTP rendering
pub mod errors;

/// Protocol constants shared by the server and its tooling
pub mod constants;

/// Persistence models (clients, consents, authorization codes, tokens, identities)
pub mod models;
