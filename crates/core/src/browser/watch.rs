//! Login-completion detection.
//!
//! No site signals "login done", so two detectors race: a poller that waits
//! for the page URL to settle back on the original host, and a manual Enter
//! press for flows the heuristic cannot classify (CAPTCHAs, odd redirects).
//! Whichever fires first wins; `tokio::select!` drops the loser.

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use url::Url;

use crate::cdp::{CdpError, PageSession};

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const STABLE_THRESHOLD: Duration = Duration::from_secs(3);

/// Blocks until the login flow is judged complete.
///
/// `original_host` is the authority of the target URL; `excluded_paths` are
/// paths on that host that do not count as settled (a SPA's landing/entry
/// route, which the flow must move past).
pub(super) async fn wait_for_login(
    page: &PageSession,
    original_host: &str,
    excluded_paths: &[&str],
) {
    tokio::select! {
        _ = watch_stability(page, original_host, excluded_paths) => {
            debug!("navigation settled on original host");
        }
        _ = wait_for_enter() => {
            debug!("manual login confirmation");
        }
    }
}

async fn watch_stability(page: &PageSession, original_host: &str, excluded_paths: &[&str]) {
    let mut tracker = StabilityTracker::new(STABLE_THRESHOLD);

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let current = match page.current_url().await {
            Ok(url) => url,
            Err(err) if poll_failure_is_fatal(&err) => {
                // Page destroyed mid-poll: go quiescent, the manual arm decides.
                futures::future::pending::<()>().await;
                return;
            }
            // Transient failure at a navigation commit; keep polling.
            Err(err) => {
                debug!(%err, "url poll failed, retrying");
                continue;
            }
        };

        if tracker.observe(&current, Instant::now())
            && settled_on_host(&current, original_host, excluded_paths)
        {
            return;
        }
    }
}

async fn wait_for_enter() {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(n) if n > 0 => {}
        // EOF or a broken stdin must not be mistaken for a confirmation.
        _ => futures::future::pending::<()>().await,
    }
}

/// Only a closed connection ends the poll; mid-navigation protocol errors
/// are expected noise during the redirect dance.
fn poll_failure_is_fatal(err: &CdpError) -> bool {
    matches!(err, CdpError::SessionClosed)
}

/// Tracks how long a polled URL has been unchanged.
struct StabilityTracker {
    threshold: Duration,
    last_url: Option<String>,
    stable_since: Instant,
}

impl StabilityTracker {
    fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_url: None,
            stable_since: Instant::now(),
        }
    }

    /// Records an observation; true when the URL has been unchanged for at
    /// least the threshold.
    fn observe(&mut self, url: &str, now: Instant) -> bool {
        if self.last_url.as_deref() != Some(url) {
            self.last_url = Some(url.to_string());
            self.stable_since = now;
            return false;
        }
        now.duration_since(self.stable_since) >= self.threshold
    }
}

/// Whether `current` sits on the original host and off every excluded path.
fn settled_on_host(current: &str, original_host: &str, excluded_paths: &[&str]) -> bool {
    let Ok(parsed) = Url::parse(current) else {
        return false;
    };

    let authority = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => return false,
    };

    authority == original_host && !excluded_paths.contains(&parsed.path())
}
