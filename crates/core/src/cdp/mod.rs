//! Minimal Chrome DevTools Protocol client.
//!
//! Covers exactly what the login driver needs: endpoint liveness probing,
//! opening and attaching to a page target, script evaluation in page context,
//! and browser-level cookie-jar retrieval.

mod client;
mod error;
mod protocol;

pub use client::{CdpClient, PageSession};
pub(crate) use client::fetch_version;
pub use error::CdpError;
pub use protocol::{BrowserVersion, CdpCookie, PageInfo};
