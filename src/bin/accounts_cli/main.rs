// ABOUTME: Accounts CLI - command-line tool for authorization server administration
// ABOUTME: Handles client provisioning, consent revocation, users and development session tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Register a relying party
//! alsamos-accounts-cli client register --client-id notes-app --name "Notes" \
//!     --redirect-uri https://notes.example.com/callback --scope "openid profile email"
//!
//! # List and deactivate clients
//! alsamos-accounts-cli client list
//! alsamos-accounts-cli client deactivate notes-app
//!
//! # Withdraw a user's consent
//! alsamos-accounts-cli consent revoke --user-id <uuid> --client-id notes-app
//!
//! # Add a user and mint a development session credential
//! alsamos-accounts-cli user add --email dev@example.com --name "Dev" --verified
//! alsamos-accounts-cli session-token --user-id <uuid>
//! ```

mod commands;
mod helpers;

use alsamos_accounts::{database::Database, errors::AppResult};
use clap::{Parser, Subcommand};
use std::env;
use tracing::info;
use uuid::Uuid;

type Result<T> = AppResult<T>;

#[derive(Parser)]
#[command(
    name = "alsamos-accounts-cli",
    about = "Alsamos accounts administration CLI",
    long_about = "Command-line tool for managing OAuth 2.0 clients, consents and users of the accounts server."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// OAuth 2.0 client management
    Client {
        #[command(subcommand)]
        action: ClientCommand,
    },

    /// Consent management
    Consent {
        #[command(subcommand)]
        action: ConsentCommand,
    },

    /// User management
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Mint a session credential for local testing
    SessionToken {
        /// User to authenticate as
        #[arg(long)]
        user_id: Uuid,

        /// Lifetime in minutes
        #[arg(long, default_value = "60")]
        ttl_minutes: i64,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum ClientCommand {
    /// Register a new relying party
    Register {
        /// Public client identifier
        #[arg(long)]
        client_id: String,

        /// Display name shown on the consent screen
        #[arg(long)]
        name: String,

        /// Allowed redirect URI (repeatable)
        #[arg(long = "redirect-uri", required = true)]
        redirect_uris: Vec<String>,

        /// Space-separated allowed scopes
        #[arg(long, default_value = "openid profile email")]
        scope: String,
    },

    /// Deactivate a client; its codes and tokens stop working
    Deactivate {
        /// Client identifier
        client_id: String,
    },

    /// Reactivate a previously deactivated client
    Activate {
        /// Client identifier
        client_id: String,
    },

    /// List registered clients
    List,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum ConsentCommand {
    /// Revoke a user's active consent for a client
    Revoke {
        /// User identifier
        #[arg(long)]
        user_id: Uuid,

        /// Client identifier
        #[arg(long)]
        client_id: String,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum UserCommand {
    /// Add a user to the identity table
    Add {
        /// Email address
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Avatar URL
        #[arg(long)]
        avatar_url: Option<String>,

        /// Mark the email as verified
        #[arg(long)]
        verified: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let database_url = cli
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:./data/accounts.db".into());

    info!("Connecting to database: {}", database_url);
    let database = Database::new(&database_url).await?;

    match cli.command {
        Command::Client { action } => match action {
            ClientCommand::Register {
                client_id,
                name,
                redirect_uris,
                scope,
            } => {
                commands::client::register(database, &client_id, &name, redirect_uris, &scope)
                    .await?;
            }
            ClientCommand::Deactivate { client_id } => {
                commands::client::set_active(&database, &client_id, false).await?;
            }
            ClientCommand::Activate { client_id } => {
                commands::client::set_active(&database, &client_id, true).await?;
            }
            ClientCommand::List => {
                commands::client::list(&database).await?;
            }
        },
        Command::Consent { action } => match action {
            ConsentCommand::Revoke { user_id, client_id } => {
                commands::consent::revoke(database, user_id, &client_id).await?;
            }
        },
        Command::User { action } => match action {
            UserCommand::Add {
                email,
                name,
                avatar_url,
                verified,
            } => {
                commands::user::add(&database, email, name, avatar_url, verified).await?;
            }
        },
        Command::SessionToken {
            user_id,
            ttl_minutes,
        } => {
            commands::user::session_token(&database, user_id, ttl_minutes).await?;
        }
    }

    Ok(())
}
