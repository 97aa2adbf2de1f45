//! Browser-driven interactive authentication.
//!
//! Attaches to (or launches) a debug-enabled browser, shows the login page,
//! waits for the SSO redirect dance to settle, then harvests credentials
//! from the browser's cookie jar and the page's localStorage.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

pub mod config;
mod launch;
mod storage;
mod watch;

use crate::cdp::{CdpClient, PageSession};
use crate::cookie::{Cookie, SameSite, url_authority};
use crate::error::{FetchError, Result};
use crate::store::SessionStore;
use config::{BrowserConfig, BrowserKind};

/// The capture flow must move past a SPA's entry route before the URL
/// settling counts as a finished login. Kept as an exclusion list rather
/// than a hard-coded check; only the capture flow uses it.
const LANDING_PATHS: &[&str] = &["/landing", "/landing/"];

/// Everything captured by one interactive login. Consumed immediately by the
/// caller; never persisted as-is.
#[derive(Debug)]
pub struct AuthResult {
    pub cookies: Vec<Cookie>,
    pub local_storage: HashMap<String, String>,
}

/// Interactive login provider. A trait so the HTTP client can be exercised
/// against a stub in tests.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Runs the full login flow and persists the captured cookies under the
    /// URL's host. Zero captured cookies is a failed login, not a session.
    async fn authenticate(&self, target_url: &str) -> Result<()>;

    /// Runs the full login flow and returns the capture (cookies plus
    /// localStorage) without persisting anything.
    async fn authenticate_and_capture(&self, target_url: &str) -> Result<AuthResult>;
}

/// Drives a real browser over CDP to complete an interactive login.
pub struct BrowserAuthenticator {
    store: SessionStore,
    kind: BrowserKind,
}

impl BrowserAuthenticator {
    pub fn new(store: SessionStore, kind: BrowserKind) -> Self {
        Self { store, kind }
    }

    async fn run_login_flow(
        &self,
        target_url: &str,
        excluded_paths: &[&str],
    ) -> Result<(CdpClient, PageSession, String)> {
        let parsed = Url::parse(target_url).map_err(|source| FetchError::InvalidUrl {
            url: target_url.to_string(),
            source,
        })?;
        let host = url_authority(&parsed)
            .ok_or_else(|| FetchError::MissingHost(target_url.to_string()))?;

        let config = BrowserConfig::resolve(self.kind);

        println!("Opening browser to: {target_url}");
        println!("Complete the login in the browser, then press Enter here (or wait for the page to settle).");

        let client = launch::attach_or_launch(&config).await?;
        let page = client.open_page(target_url).await?;

        watch::wait_for_login(&page, &host, excluded_paths).await;
        println!("Login completed. Capturing credentials...");

        Ok((client, page, host))
    }

    async fn capture_cookies(&self, client: &CdpClient) -> Result<Vec<Cookie>> {
        let cookies = client
            .all_cookies()
            .await?
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                path: c.path,
                domain: c.domain,
                expires: c.expires,
                max_age: None,
                secure: c.secure,
                http_only: c.http_only,
                same_site: SameSite::from_cdp(c.same_site.as_deref()),
            })
            .collect();
        Ok(cookies)
    }
}

#[async_trait]
impl Authenticator for BrowserAuthenticator {
    async fn authenticate(&self, target_url: &str) -> Result<()> {
        let (client, page, host) = self.run_login_flow(target_url, &[]).await?;

        let captured = self.capture_cookies(&client).await?;
        let _ = client.close_page(page.target_id()).await;

        let cookies = require_captured(captured)?;
        println!("Captured {} cookies", cookies.len());
        self.store.save(&host, &cookies)?;
        println!("Session saved for host: {host}");

        Ok(())
    }

    async fn authenticate_and_capture(&self, target_url: &str) -> Result<AuthResult> {
        let (client, page, host) = self.run_login_flow(target_url, LANDING_PATHS).await?;

        let cookies = self.capture_cookies(&client).await?;
        println!("Captured {} cookies", cookies.len());
        info!(host, cookies = cookies.len(), "capture flow finished");

        let storage = storage::extract_local_storage(&page).await;
        let _ = client.close_page(page.target_id()).await;

        Ok(finish_capture(cookies, storage))
    }
}

/// Zero cookies after a completed flow means the login failed; there is no
/// session to persist.
fn require_captured(cookies: Vec<Cookie>) -> Result<Vec<Cookie>> {
    if cookies.is_empty() {
        return Err(FetchError::NoCookiesCaptured);
    }
    Ok(cookies)
}

/// Assembles the capture result. A failed localStorage read degrades to an
/// empty map; not every site uses localStorage and the cookies are still
/// worth returning.
fn finish_capture(
    cookies: Vec<Cookie>,
    storage: std::result::Result<HashMap<String, String>, crate::cdp::CdpError>,
) -> AuthResult {
    let local_storage = match storage {
        Ok(entries) => entries,
        Err(err) => {
            warn!(%err, "could not read localStorage");
            HashMap::new()
        }
    };

    AuthResult {
        cookies,
        local_storage,
    }
}
