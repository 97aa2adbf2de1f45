//! CDP wire messages and the endpoint metadata records this client consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    /// Present on events, which this client does not subscribe to.
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
}

/// `/json/version` response subset.
///
/// Chrome returns PascalCase names on this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: Option<String>,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// `/json/new` and `/json/list` page record subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// One cookie as reported by `Storage.getCookies`.
///
/// Deliberately loose: Chromium 136+ changed `partitionKey` from string to
/// object, so only the fields this tool consumes are declared.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_session_and_params() {
        let req = CdpRequest {
            id: 7,
            method: "Storage.getCookies".into(),
            params: None,
            session_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"id":7,"method":"Storage.getCookies"}"#);
    }

    #[test]
    fn cookie_tolerates_unknown_fields_and_missing_same_site() {
        let json = r#"{
            "name": "sid",
            "value": "abc",
            "domain": ".example.com",
            "path": "/",
            "expires": 1900000000.5,
            "size": 40,
            "secure": true,
            "httpOnly": true,
            "partitionKey": {"topLevelSite": "https://example.com"}
        }"#;

        let cookie: CdpCookie = serde_json::from_str(json).unwrap();
        assert_eq!(cookie.name, "sid");
        assert!(cookie.http_only);
        assert_eq!(cookie.same_site, None);
    }

    #[test]
    fn version_parses_chrome_pascal_case() {
        let json = r#"{"Browser":"Chrome/126.0","webSocketDebuggerUrl":"ws://127.0.0.1:9222/devtools/browser/x"}"#;
        let version: BrowserVersion = serde_json::from_str(json).unwrap();
        assert_eq!(version.browser.as_deref(), Some("Chrome/126.0"));
        assert!(version.web_socket_debugger_url.starts_with("ws://"));
    }
}
