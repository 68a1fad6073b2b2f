// ABOUTME: Redirect URL construction for authorization responses
// ABOUTME: Appends query parameters without disturbing the registered URI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::models::OAuth2Error;
use tracing::error;
use url::Url;

/// Append `params` to `base`, skipping `None` values
///
/// # Errors
/// Returns `server_error` if `base` is not an absolute URL; registered
/// redirects are validated at provisioning so this indicates bad data.
pub fn with_query(base: &str, params: &[(&str, Option<&str>)]) -> Result<String, OAuth2Error> {
    let mut url = Url::parse(base).map_err(|e| {
        error!("Stored redirect target is not a valid URL: {e}");
        OAuth2Error::server_error("Invalid redirect target")
    })?;
    let present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(key, value)| value.map(|value| (*key, value)))
        .collect();
    if !present.is_empty() {
        url.query_pairs_mut().extend_pairs(present);
    }
    Ok(url.into())
}

/// Redirect carrying an OAuth2 error and the caller's state
///
/// # Errors
/// Returns `server_error` if `redirect_uri` is not an absolute URL
pub fn error_redirect(
    redirect_uri: &str,
    error: &OAuth2Error,
    state: Option<&str>,
) -> Result<String, OAuth2Error> {
    with_query(
        redirect_uri,
        &[
            ("error", Some(error.error.as_str())),
            ("error_description", Some(error.error_description.as_str())),
            ("state", state),
        ],
    )
}
