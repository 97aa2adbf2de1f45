//! Per-origin localStorage capture.

use std::collections::HashMap;

use crate::cdp::{CdpError, PageSession};

/// Enumerates every localStorage entry of the page's origin into one JSON
/// object, returned as text. Must run in page context; localStorage is not
/// reachable from a browser-level session.
const LOCAL_STORAGE_JS: &str = r#"(() => {
    const result = {};
    for (let i = 0; i < localStorage.length; i++) {
        const key = localStorage.key(i);
        result[key] = localStorage.getItem(key);
    }
    return JSON.stringify(result);
})()"#;

/// Reads all localStorage entries from `page`.
pub(super) async fn extract_local_storage(
    page: &PageSession,
) -> Result<HashMap<String, String>, CdpError> {
    let value = page.evaluate(LOCAL_STORAGE_JS).await?;
    let text = value
        .as_str()
        .ok_or_else(|| CdpError::InvalidResponse("localStorage script returned non-string".into()))?;
    parse_local_storage_json(text)
}

fn parse_local_storage_json(text: &str) -> Result<HashMap<String, String>, CdpError> {
    Ok(serde_json::from_str(text)?)
}
