// ABOUTME: Server binary for the Alsamos accounts OAuth 2.0 authorization server
// ABOUTME: Loads configuration, prepares the database and serves the axum router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Alsamos Accounts Server Binary
//!
//! Starts the authorization server: authorize, issue-code, token and
//! introspection endpoints plus health probes.

use alsamos_accounts::{
    config::ServerConfig, database::Database, logging, resources::ServerResources, routes,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "alsamos-accounts-server")]
#[command(about = "Alsamos accounts - OAuth 2.0 authorization server")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    config.validate()?;
    info!("{}", config.summary());

    ensure_database_directory(&config.database_url)?;
    let database = Database::new(&config.database_url).await?;
    info!("Database initialized: {}", config.database_url);

    let bind_address = config.bind_address();
    let app = routes::router(Arc::new(ServerResources::new(database, config)));

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("Accounts server listening on http://{bind_address}");
    display_available_endpoints(&bind_address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Accounts server stopped");
    Ok(())
}

/// Create the parent directory of a file-backed `SQLite` database
fn ensure_database_directory(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.trim_start_matches("//");
    if path.contains(":memory:") {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[allow(clippy::cognitive_complexity)]
fn display_available_endpoints(bind_address: &str) {
    info!("=== Available API Endpoints ===");
    info!("   Authorization:  GET  http://{bind_address}/oauth2/authorize");
    info!("   Issue Code:     POST http://{bind_address}/oauth2/issue-code");
    info!("   Token:          POST http://{bind_address}/oauth2/token");
    info!("   Introspection:  POST http://{bind_address}/oauth2/introspect");
    info!("   Discovery:      GET  http://{bind_address}/.well-known/oauth-authorization-server");
    info!("   Health:         GET  http://{bind_address}/health");
    info!("=== End of Endpoint List ===");
}
