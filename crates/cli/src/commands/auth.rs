use ssofetch::{FetchClient, Result, session_host};
use tracing::info;

/// Forces a fresh login: any cached session for the host is discarded first
/// so the browser flow cannot silently reuse stale cookies.
pub async fn execute(client: &FetchClient, url: &str) -> Result<()> {
    let host = session_host(url)?;
    if client.clear_session(&host)? {
        info!(target = "ssofetch", host, "cleared existing session");
    }

    client.authenticate(url).await
}
