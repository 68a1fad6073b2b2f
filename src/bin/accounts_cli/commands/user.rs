// ABOUTME: User commands for the accounts CLI
// ABOUTME: Adds identity rows and mints development session credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use accounts_core::models::UserIdentity;
use alsamos_accounts::{
    auth::SessionAuthenticator,
    database::Database,
    errors::{AppError, AppResult},
};
use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

/// Add a user
pub async fn add(
    database: &Database,
    email: String,
    name: Option<String>,
    avatar_url: Option<String>,
    verified: bool,
) -> AppResult<()> {
    if !email.contains('@') {
        return Err(AppError::invalid_input(format!("Invalid email: {email}")));
    }

    let user = UserIdentity {
        id: Uuid::new_v4(),
        email,
        email_verified: verified,
        name,
        avatar_url,
    };
    database.create_user(&user, Utc::now()).await?;

    println!("User created");
    println!("   ID:       {}", user.id);
    println!("   Email:    {}", user.email);
    println!("   Verified: {}", user.email_verified);
    Ok(())
}

/// Mint a session credential signed with `SESSION_JWT_SECRET`
pub async fn session_token(database: &Database, user_id: Uuid, ttl_minutes: i64) -> AppResult<()> {
    let secret = env::var("SESSION_JWT_SECRET")
        .map_err(|_| AppError::config("SESSION_JWT_SECRET must be set to mint session tokens"))?;
    let ttl = session_ttl(ttl_minutes)?;
    if database.get_user_identity(user_id).await?.is_none() {
        return Err(AppError::not_found(format!("User {user_id}")));
    }

    let token = SessionAuthenticator::new(secret.as_bytes())
        .issue(user_id, ttl)?;
    println!("{token}");
    Ok(())
}

fn session_ttl(minutes: i64) -> AppResult<Duration> {
    if minutes <= 0 {
        return Err(AppError::invalid_input("ttl-minutes must be positive"));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| AppError::invalid_input(format!("ttl-minutes out of range: {minutes}")))
}
