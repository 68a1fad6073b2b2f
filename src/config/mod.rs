// ABOUTME: Configuration module for the accounts authorization server
// ABOUTME: Re-exports environment-driven server configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration for the accounts server
//!
//! All settings come from environment variables; the server binary layers a
//! few `clap` overrides on top.

/// Environment and server configuration
pub mod environment;

pub use environment::{AuthConfig, Environment, ServerConfig};
