//! Bearer-token recovery from the Auth0 SPA SDK localStorage cache, plus the
//! `KEY=value` output formatter used by the `token` command.

use std::collections::HashMap;

use serde::Deserialize;

use crate::cookie::Cookie;
use crate::error::{FetchError, Result};

/// Cache keys written by the Auth0 SPA SDK all carry this marker.
const AUTH0_CACHE_PREFIX: &str = "@@auth0spajs@@";

#[derive(Debug, Deserialize)]
struct Auth0CacheEntry {
    body: Auth0CacheBody,
    #[serde(rename = "expiresAt", default)]
    #[allow(dead_code)]
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct Auth0CacheBody {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    expires_in: i64,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: String,
}

/// Extracts the access token from an Auth0 SPA SDK cache entry in
/// `local_storage`.
///
/// The first key carrying the cache prefix is used; in practice a page holds
/// exactly one. Fails when no key matches, the entry is not the expected
/// record shape, or the parsed access token is empty.
pub fn parse_auth0_token(local_storage: &HashMap<String, String>) -> Result<String> {
    for (key, value) in local_storage {
        if !key.starts_with(AUTH0_CACHE_PREFIX) {
            continue;
        }

        let entry: Auth0CacheEntry =
            serde_json::from_str(value).map_err(FetchError::MalformedTokenEntry)?;

        if entry.body.access_token.is_empty() {
            return Err(FetchError::EmptyAccessToken);
        }

        return Ok(entry.body.access_token);
    }

    Err(FetchError::TokenNotFound)
}

/// Formats captured credentials as newline-joined `KEY=value` lines.
///
/// Emits `JWT=<token>` when `jwt` is non-empty and `COOKIE=n=v; n2=v2` when
/// cookies are present; either line is omitted when its input is absent, and
/// both absent yields the empty string.
pub fn format_token_output(jwt: &str, cookies: &[Cookie]) -> String {
    let mut lines = Vec::new();

    if !jwt.is_empty() {
        lines.push(format!("JWT={jwt}"));
    }

    if !cookies.is_empty() {
        let pairs: Vec<String> = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        lines.push(format!("COOKIE={}", pairs.join("; ")));
    }

    lines.join("\n")
}
