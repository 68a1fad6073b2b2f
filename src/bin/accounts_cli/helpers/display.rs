// ABOUTME: Output formatting helpers for the accounts CLI
// ABOUTME: Provides consistent display functions for registered clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use accounts_core::models::OAuth2Client;

/// Display one client in detail
pub fn display_client(client: &OAuth2Client) {
    println!("{}", "=".repeat(60));
    println!("   Client ID:     {}", client.client_id);
    println!("   Name:          {}", client.client_name);
    println!("   Active:        {}", client.is_active);
    println!("   Scopes:        {}", client.allowed_scopes.join(" "));
    println!("   Redirect URIs:");
    for uri in &client.redirect_uris {
        println!("     - {uri}");
    }
    println!(
        "   Created:       {}",
        client.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("{}", "=".repeat(60));
}

/// Display clients as a compact table
pub fn display_client_table(clients: &[OAuth2Client]) {
    println!("{:<28} {:<24} {:<8} SCOPES", "CLIENT ID", "NAME", "ACTIVE");
    println!("{}", "-".repeat(80));
    for client in clients {
        println!(
            "{:<28} {:<24} {:<8} {}",
            client.client_id,
            client.client_name,
            if client.is_active { "yes" } else { "no" },
            client.allowed_scopes.join(" ")
        );
    }
}
