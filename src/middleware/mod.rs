// ABOUTME: HTTP middleware for CORS and request correlation
// ABOUTME: Layers applied to every route of the accounts server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// CORS configuration
pub mod cors;
/// Request ids and tracing spans
pub mod request_id;

pub use cors::setup_cors;
pub use request_id::{MakeRequestIdentifier, RequestSpan, REQUEST_ID_HEADER};
