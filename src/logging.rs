// ABOUTME: tracing-subscriber setup for the accounts server
// ABOUTME: Chooses json, pretty or compact output and quiets chatty dependency crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Logging is configured from the environment only:
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | base filter, default `info` |
//! | `LOG_FORMAT` | `json`, `pretty` (default) or `compact` |
//! | `LOG_INCLUDE_LOCATION` | add file and line (always on in production) |
//! | `LOG_INCLUDE_SPANS` | emit span open and close events |
//! | `SERVICE_NAME` / `ENVIRONMENT` | reported in the startup line |
//!
//! Token and code values are never passed to a log macro; events carry
//! client ids, user ids and row ids instead.

use anyhow::{anyhow, Result};
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const SERVICE_NAME: &str = "alsamos-accounts";

/// Dependency targets held above our own level
const QUIET_TARGETS: [&str; 3] = ["hyper=warn", "sqlx=warn", "tower_http=info"];

/// Output style for the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-field human output
    Pretty,
    /// Single-line output without targets
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else if value.eq_ignore_ascii_case("compact") {
            Self::Compact
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive for `alsamos_accounts` and the default level
    pub level: String,
    /// Output style
    pub format: LogFormat,
    /// Attach source file and line to events
    pub include_location: bool,
    /// Emit span lifecycle events
    pub include_spans: bool,
    /// Reported service name
    pub service_name: String,
    /// Deployment environment name
    pub environment: String,
}

impl LoggingConfig {
    /// Read settings from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());
        Self {
            level: lookup("RUST_LOG").unwrap_or_else(|| "info".into()),
            format: lookup("LOG_FORMAT").map_or(LogFormat::Pretty, |v| LogFormat::parse(&v)),
            include_location: environment == "production"
                || lookup("LOG_INCLUDE_LOCATION").is_some(),
            include_spans: lookup("LOG_INCLUDE_SPANS").is_some(),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| SERVICE_NAME.into()),
            environment,
        }
    }

    fn filter(&self) -> EnvFilter {
        let own = format!("alsamos_accounts={}", self.level);
        QUIET_TARGETS
            .iter()
            .copied()
            .chain([own.as_str()])
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::new(&self.level), EnvFilter::add_directive)
    }

    /// Install the global subscriber and log the startup line
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let spans = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_span_events(spans);
        let registry = tracing_subscriber::registry().with(self.filter());

        match self.format {
            LogFormat::Json => registry.with(layer.json()).try_init(),
            LogFormat::Pretty => registry.with(layer).try_init(),
            LogFormat::Compact => registry.with(layer.compact().with_target(false)).try_init(),
        }
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

        info!(
            service.name = %self.service_name,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Configure logging from the environment and install it
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}
