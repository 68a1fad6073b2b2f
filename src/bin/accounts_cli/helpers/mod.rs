// ABOUTME: Helper modules for the accounts CLI
// ABOUTME: Output formatting shared by commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod display;
