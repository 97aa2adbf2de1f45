//! Cookie data model and the domain-matching predicate.

use serde::{Deserialize, Serialize};

/// Cross-site transmission policy carried by a captured cookie.
///
/// CDP reports this as an optional string; anything unrecognized maps to
/// [`SameSite::Unspecified`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
    #[default]
    Unspecified,
}

impl SameSite {
    pub fn from_cdp(value: Option<&str>) -> Self {
        match value {
            Some("Strict") => SameSite::Strict,
            Some("Lax") => SameSite::Lax,
            Some("None") => SameSite::None,
            _ => SameSite::Unspecified,
        }
    }
}

/// A cookie captured from the browser's jar, immutable once built.
///
/// Serializes to the camelCase record stored in per-host session files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub domain: String,
    /// Expiry as seconds since the epoch; negative for session cookies.
    #[serde(default)]
    pub expires: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: SameSite,
}

/// Decides whether a cookie scoped to `cookie_domain` applies to `host`.
///
/// An empty cookie domain matches everything. A single leading dot on either
/// side is ignored. Otherwise the host must equal the domain or be a
/// subdomain of it; there is no wildcard matching.
pub fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    if cookie_domain.is_empty() {
        return true;
    }

    let domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);
    let host = host.strip_prefix('.').unwrap_or(host);

    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Authority component (`host[:port]`) used to key sessions, as in
/// `app.example.com` or `127.0.0.1:8443`.
pub(crate) fn url_authority(url: &url::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_includes_explicit_port_only() {
        let with_port = url::Url::parse("https://app.example.com:8443/x").unwrap();
        assert_eq!(url_authority(&with_port).unwrap(), "app.example.com:8443");

        let without = url::Url::parse("https://app.example.com/x").unwrap();
        assert_eq!(url_authority(&without).unwrap(), "app.example.com");
    }

    #[test]
    fn empty_domain_matches_any_host() {
        assert!(domain_matches("", "app.example.com"));
        assert!(domain_matches("", ""));
    }

    #[test]
    fn exact_match_ignores_single_leading_dot() {
        assert!(domain_matches("example.com", "example.com"));
        assert!(domain_matches(".example.com", "example.com"));
        assert!(domain_matches("example.com", ".example.com"));
        assert!(domain_matches(".example.com", ".example.com"));
    }

    #[test]
    fn subdomain_is_contained() {
        assert!(domain_matches("example.com", "sub.example.com"));
        assert!(domain_matches(".example.com", "deep.sub.example.com"));
    }

    #[test]
    fn suffix_without_dot_boundary_is_rejected() {
        assert!(!domain_matches("example.com", "notexample.com"));
    }

    #[test]
    fn unrelated_domain_is_rejected() {
        assert!(!domain_matches("other.com", "example.com"));
    }

    #[test]
    fn parent_host_does_not_match_subdomain_cookie() {
        assert!(!domain_matches("sub.example.com", "example.com"));
    }

    #[test]
    fn same_site_maps_from_cdp_strings() {
        assert_eq!(SameSite::from_cdp(Some("Strict")), SameSite::Strict);
        assert_eq!(SameSite::from_cdp(Some("Lax")), SameSite::Lax);
        assert_eq!(SameSite::from_cdp(Some("None")), SameSite::None);
        assert_eq!(SameSite::from_cdp(Some("weird")), SameSite::Unspecified);
        assert_eq!(SameSite::from_cdp(None), SameSite::Unspecified);
    }

    #[test]
    fn cookie_round_trips_through_session_record_format() {
        let cookie = Cookie {
            name: "sid".into(),
            value: "abc".into(),
            path: "/".into(),
            domain: ".example.com".into(),
            expires: 1_900_000_000.0,
            max_age: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        };

        let json = serde_json::to_string(&cookie).unwrap();
        assert!(json.contains("\"httpOnly\":true"), "camelCase keys: {json}");
        assert!(json.contains("\"sameSite\":\"Lax\""), "enum as string: {json}");

        let back: Cookie = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cookie);
    }
}
