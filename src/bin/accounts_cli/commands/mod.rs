// ABOUTME: Command modules for the accounts CLI
// ABOUTME: Client, consent and user administration commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod client;
pub mod consent;
pub mod user;
