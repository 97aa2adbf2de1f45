//! Browser-driven SSO authentication with a session-aware HTTP client.
//!
//! The crate drives a local Chromium-family browser over its remote-debugging
//! protocol to complete an interactive single-sign-on flow, harvests the
//! resulting cookies (and localStorage token cache), persists them per host,
//! and replays them on subsequent scripted HTTP requests.

pub mod browser;
pub mod cdp;
pub mod client;
pub mod cookie;
pub mod error;
pub mod store;
pub mod token;

pub use browser::{AuthResult, Authenticator, BrowserAuthenticator};
pub use browser::config::{BrowserConfig, BrowserKind};
pub use client::{FetchClient, session_host};
pub use cookie::{Cookie, SameSite, domain_matches};
pub use error::{FetchError, Result};
pub use store::SessionStore;
