// ABOUTME: Route module organization for the accounts server HTTP endpoints
// ABOUTME: Assembles OAuth 2.0 and health routes behind tracing, request-id and CORS layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the accounts server
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to the `oauth2_server` service layer.

/// Health check and readiness routes
pub mod health;
/// OAuth 2.0 authorization server routes
pub mod oauth2;

/// Health check route handlers
pub use health::HealthRoutes;
/// OAuth 2.0 server route handlers
pub use oauth2::OAuth2Routes;

use crate::middleware::{setup_cors, MakeRequestIdentifier, RequestSpan};
use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Build the complete application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config);

    Router::new()
        .merge(OAuth2Routes::routes(resources.clone()))
        .merge(HealthRoutes::routes(resources))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestIdentifier))
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
}
