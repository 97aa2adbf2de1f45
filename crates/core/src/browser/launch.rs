//! Attach-or-launch: reuse a debug-enabled browser when one is listening,
//! otherwise start one and wait for its debug port.

use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::info;

use super::config::BrowserConfig;
use crate::cdp::{self, CdpClient};
use crate::error::{FetchError, Result};

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const LAUNCH_POLL_INTERVAL: Duration = Duration::from_millis(500);
const LAUNCH_POLL_ATTEMPTS: u32 = 30;

/// Connects to the browser described by `config`, launching it if nothing is
/// listening on its debug port.
///
/// Neither an attached nor a launched browser is ever closed by this crate;
/// the user may keep using it after the flow finishes.
pub(super) async fn attach_or_launch(config: &BrowserConfig) -> Result<CdpClient> {
    let endpoint = config.debug_endpoint();

    if cdp::fetch_version(&endpoint, Some(PROBE_TIMEOUT)).await.is_ok() {
        info!(kind = %config.kind, port = config.debug_port, "attaching to running browser");
        return Ok(CdpClient::connect(&endpoint).await?);
    }

    let executable = config.executable.as_deref().ok_or_else(|| {
        FetchError::BrowserLaunch(format!(
            "could not find a {} executable; install it or start it manually with \
             --remote-debugging-port={}",
            config.kind, config.debug_port
        ))
    })?;

    info!(kind = %config.kind, %executable, port = config.debug_port, "launching browser");

    let mut cmd = Command::new(executable);
    cmd.arg(format!("--remote-debugging-port={}", config.debug_port))
        .arg(format!("--user-data-dir={}", config.user_data_dir.display()))
        .arg("--remote-allow-origins=*")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

    let mut child = cmd.spawn().map_err(|err| {
        FetchError::BrowserLaunch(format!("failed to launch {executable}: {err}"))
    })?;

    for _ in 0..LAUNCH_POLL_ATTEMPTS {
        tokio::time::sleep(LAUNCH_POLL_INTERVAL).await;

        if let Ok(Some(status)) = child.try_wait() {
            return Err(FetchError::BrowserLaunch(format!(
                "browser exited before its debug port opened (status: {status})"
            )));
        }

        if cdp::fetch_version(&endpoint, Some(PROBE_TIMEOUT)).await.is_ok() {
            return Ok(CdpClient::connect(&endpoint).await?);
        }
    }

    Err(FetchError::BrowserLaunch(format!(
        "debug port {} did not open within {} seconds",
        config.debug_port,
        (LAUNCH_POLL_INTERVAL * LAUNCH_POLL_ATTEMPTS).as_secs()
    )))
}
