// ABOUTME: Space-delimited scope sets with order-preserving de-duplication
// ABOUTME: Subset checks for consent coverage and client allowance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use accounts_core::constants::scopes::DEFAULT_SCOPE;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A set of scope tokens, kept in first-seen order for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    /// Parse a space-delimited scope string, dropping duplicates
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut scopes: Vec<String> = Vec::new();
        for scope in raw.split_whitespace() {
            if !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.to_owned());
            }
        }
        Self(scopes)
    }

    /// Parse the requested scope, falling back to the default set when blank
    #[must_use]
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => Self::parse(raw),
            _ => Self::parse(DEFAULT_SCOPE),
        }
    }

    /// Whether `scope` is in the set
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    /// Whether every scope in `self` is also in `other`
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0.iter().all(|scope| other.contains(scope))
    }

    /// Scopes in `self` that fail `allowed`
    #[must_use]
    pub fn rejected_by<F>(&self, allowed: F) -> Vec<&str>
    where
        F: Fn(&str) -> bool,
    {
        self.0
            .iter()
            .map(String::as_str)
            .filter(|scope| !allowed(scope))
            .collect()
    }

    /// Whether the set has no scopes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the scopes in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for ScopeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0.join(" "))
    }
}
