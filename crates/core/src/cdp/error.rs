//! CDP client error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    /// The debugging endpoint is not reachable.
    #[error("browser not available at {0}")]
    BrowserNotAvailable(String),

    /// WebSocket connect or transport failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The browser rejected a command.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    /// Script evaluation threw in page context.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// No response arrived within the per-call deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The connection closed while a call was outstanding. Typically the
    /// page or browser went away mid-poll.
    #[error("session closed")]
    SessionClosed,

    /// A response arrived but was not the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(err.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(err: reqwest::Error) -> Self {
        CdpError::Http(err.to_string())
    }
}
