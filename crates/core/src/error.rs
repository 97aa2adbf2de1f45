//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::cdp::CdpError;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Target URL could not be parsed. Returned before any browser work.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// URL parsed but carries no host to key a session on.
    #[error("URL '{0}' has no host")]
    MissingHost(String),

    /// Browser executable missing, or the debug port never opened.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Remote-debugging protocol failure.
    #[error(transparent)]
    Cdp(#[from] CdpError),

    /// The login flow finished but the browser held no cookies at all.
    /// Distinguishes a completed-but-failed login from a transport error.
    #[error("no cookies captured - login may have failed")]
    NoCookiesCaptured,

    /// A cached session file exists but does not parse.
    #[error("malformed session file {path}: {source}")]
    MalformedSession {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No localStorage key carries the SSO auth-library cache prefix.
    #[error("no SSO token found in localStorage")]
    TokenNotFound,

    /// A matching cache entry exists but is not the expected record shape.
    #[error("malformed token cache entry: {0}")]
    MalformedTokenEntry(#[source] serde_json::Error),

    /// The token cache entry parsed but its access_token field is empty.
    #[error("token cache entry has no access_token")]
    EmptyAccessToken,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
