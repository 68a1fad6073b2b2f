// ABOUTME: Liveness and readiness probes for the accounts server
// ABOUTME: Readiness pings the credential store and reports 503 when it does not answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Probe response body
#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'static str>,
    timestamp: DateTime<Utc>,
}

impl ProbeStatus {
    fn now(status: &'static str) -> Self {
        Self {
            status,
            version: None,
            timestamp: Utc::now(),
        }
    }
}

/// `/health` and `/ready`
pub struct HealthRoutes;

impl HealthRoutes {
    /// Probe routes, bound to the shared resources for the store ping
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
            .with_state(resources)
    }

    async fn handle_health() -> Json<ProbeStatus> {
        Json(ProbeStatus {
            version: Some(env!("CARGO_PKG_VERSION")),
            ..ProbeStatus::now("healthy")
        })
    }

    async fn handle_ready(
        State(resources): State<Arc<ServerResources>>,
    ) -> AppResult<Json<ProbeStatus>> {
        resources.database.ping().await.map_err(|e| {
            warn!(error = %e, "Readiness probe failed");
            AppError::unavailable(e.message)
        })?;
        Ok(Json(ProbeStatus::now("ready")))
    }
}
