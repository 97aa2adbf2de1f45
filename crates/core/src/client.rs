//! Session-aware HTTP client.
//!
//! Attaches cached cookies to outgoing requests and, on the `*_with_auth`
//! paths, self-heals: authenticate when no session exists, and on a 401
//! re-authenticate and retry exactly once.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode, header};
use tracing::debug;
use url::Url;

use crate::browser::config::BrowserKind;
use crate::browser::{AuthResult, Authenticator, BrowserAuthenticator};
use crate::cookie::{Cookie, domain_matches, url_authority};
use crate::error::{FetchError, Result};
use crate::store::SessionStore;

/// Session host (URL authority) a request's cookies are keyed under.
pub fn session_host(target_url: &str) -> Result<String> {
    let parsed = Url::parse(target_url).map_err(|source| FetchError::InvalidUrl {
        url: target_url.to_string(),
        source,
    })?;
    url_authority(&parsed).ok_or_else(|| FetchError::MissingHost(target_url.to_string()))
}

/// HTTP client that injects cached session cookies per request.
pub struct FetchClient {
    http: reqwest::Client,
    store: SessionStore,
    auth: Arc<dyn Authenticator>,
}

impl FetchClient {
    /// Builds a client backed by the default session store and a real
    /// browser authenticator for `kind`.
    pub fn new(kind: BrowserKind) -> Result<Self> {
        let store = SessionStore::open_default()?;
        let auth = Arc::new(BrowserAuthenticator::new(store.clone(), kind));
        Ok(Self::with_authenticator(store, auth))
    }

    /// Builds a client from explicit parts. The seam tests use to substitute
    /// a stub authenticator.
    pub fn with_authenticator(store: SessionStore, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
            auth,
        }
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        self.send(Method::GET, url, None, None).await
    }

    pub async fn post(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: Option<String>,
    ) -> Result<Response> {
        self.send(Method::POST, url, content_type, body).await
    }

    pub async fn put(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: Option<String>,
    ) -> Result<Response> {
        self.send(Method::PUT, url, content_type, body).await
    }

    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.send(Method::DELETE, url, None, None).await
    }

    /// GET with on-demand authentication and a single 401 retry.
    pub async fn get_with_auth(&self, url: &str) -> Result<Response> {
        self.send_with_auth(Method::GET, url, None, None).await
    }

    /// POST with on-demand authentication and a single 401 retry.
    pub async fn post_with_auth(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: Option<String>,
    ) -> Result<Response> {
        self.send_with_auth(Method::POST, url, content_type, body).await
    }

    pub async fn authenticate(&self, url: &str) -> Result<()> {
        self.auth.authenticate(url).await
    }

    pub async fn authenticate_and_capture(&self, url: &str) -> Result<AuthResult> {
        self.auth.authenticate_and_capture(url).await
    }

    /// Cookies currently cached for `host`, if any.
    pub fn cached_cookies(&self, host: &str) -> Result<Vec<Cookie>> {
        self.store.load(host)
    }

    pub fn list_sessions(&self) -> Result<Vec<String>> {
        self.store.list_hosts()
    }

    /// Drops the cached session for `host`. Returns whether one existed.
    pub fn clear_session(&self, host: &str) -> Result<bool> {
        self.store.clear(host)
    }

    /// Issues the request with matching cached cookies attached. A 401
    /// passes through unmodified; no retry happens at this layer.
    async fn send(
        &self,
        method: Method,
        url: &str,
        content_type: Option<&str>,
        body: Option<String>,
    ) -> Result<Response> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let authority =
            url_authority(&parsed).ok_or_else(|| FetchError::MissingHost(url.to_string()))?;
        // Cookie domains never carry ports; match against the bare host.
        let host = parsed.host_str().unwrap_or_default().to_string();

        let cookies = self.store.load(&authority)?;
        let mut request = self.http.request(method, parsed);

        if let Some(value) = cookie_header(&cookies, &host) {
            request = request.header(header::COOKIE, value);
        }
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        debug!(%authority, cookies = cookies.len(), "sending request");
        Ok(request.send().await?)
    }

    async fn send_with_auth(
        &self,
        method: Method,
        url: &str,
        content_type: Option<&str>,
        body: Option<String>,
    ) -> Result<Response> {
        let authority = session_host(url)?;

        if self.store.load(&authority)?.is_empty() {
            println!("No session found for {authority}, authenticating...");
            self.auth.authenticate(url).await?;
        }

        let response = self
            .send(method.clone(), url, content_type, body.clone())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        println!("Session expired for {authority}, re-authenticating...");
        self.auth.authenticate(url).await?;

        // One retry only; a second 401 is returned as-is.
        self.send(method, url, content_type, body).await
    }
}

/// Builds the `Cookie` header from every cached cookie matching `host`,
/// preserving stored order. None when nothing matches.
fn cookie_header(cookies: &[Cookie], host: &str) -> Option<String> {
    let pairs: Vec<String> = cookies
        .iter()
        .filter(|c| domain_matches(&c.domain, host))
        .map(|c| format!("{}={}", c.name, c.value))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::cookie::SameSite;

    fn cookie(name: &str, value: &str, domain: &str) -> Cookie {
        Cookie {
            name: name.into(),
            value: value.into(),
            path: "/".into(),
            domain: domain.into(),
            expires: 2_000_000_000.0,
            max_age: None,
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }

    /// Authenticator that "logs in" by saving a fixed cookie set, counting
    /// how often it is invoked.
    struct StubAuthenticator {
        store: SessionStore,
        cookies: Vec<Cookie>,
        calls: AtomicUsize,
    }

    impl StubAuthenticator {
        fn new(store: SessionStore, cookies: Vec<Cookie>) -> Arc<Self> {
            Arc::new(Self {
                store,
                cookies,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Authenticator for StubAuthenticator {
        async fn authenticate(&self, target_url: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let host = session_host(target_url)?;
            self.store.save(&host, &self.cookies)
        }

        async fn authenticate_and_capture(&self, _target_url: &str) -> Result<AuthResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthResult {
                cookies: self.cookies.clone(),
                local_storage: Default::default(),
            })
        }
    }

    fn harness(cookies: Vec<Cookie>) -> (TempDir, FetchClient, Arc<StubAuthenticator>) {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path().join("auth")).unwrap();
        let auth = StubAuthenticator::new(store.clone(), cookies);
        let client = FetchClient::with_authenticator(store, auth.clone());
        (temp, client, auth)
    }

    #[tokio::test]
    async fn missing_session_authenticates_before_the_request() {
        let server = MockServer::start().await;
        // The cookie header proves authentication happened first.
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("cookie", "sid=fresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (_temp, client, auth) = harness(vec![cookie("sid", "fresh", "")]);

        let response = client
            .get_with_auth(&format!("{}/data", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(auth.calls(), 1);
    }

    #[tokio::test]
    async fn cached_session_sends_only_domain_matching_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("cookie", "a=1; b=2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (_temp, client, auth) = harness(vec![]);
        let url = format!("{}/data", server.uri());
        let host = session_host(&url).unwrap();
        client
            .store
            .save(
                &host,
                &[
                    cookie("a", "1", ""),
                    cookie("b", "2", "127.0.0.1"),
                    cookie("c", "3", "other.com"),
                ],
            )
            .unwrap();

        let response = client.get_with_auth(&url).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(auth.calls(), 0, "existing session must not re-authenticate");
    }

    #[tokio::test]
    async fn unauthorized_reauthenticates_and_retries_exactly_once() {
        let server = MockServer::start().await;
        // Always 401: the retry must also come through, and then stop.
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let (_temp, client, auth) = harness(vec![cookie("sid", "fresh", "")]);
        let url = format!("{}/data", server.uri());
        let host = session_host(&url).unwrap();
        client.store.save(&host, &[cookie("sid", "stale", "")]).unwrap();

        let response = client.get_with_auth(&url).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(auth.calls(), 1, "one re-authentication, never a second");
    }

    #[tokio::test]
    async fn retry_after_reauth_can_succeed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("cookie", "sid=stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("cookie", "sid=fresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (_temp, client, auth) = harness(vec![cookie("sid", "fresh", "")]);
        let url = format!("{}/data", server.uri());
        let host = session_host(&url).unwrap();
        client.store.save(&host, &[cookie("sid", "stale", "")]).unwrap();

        let response = client.get_with_auth(&url).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(auth.calls(), 1);
    }

    #[tokio::test]
    async fn plain_requests_never_retry_a_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let (_temp, client, auth) = harness(vec![]);
        let response = client
            .get(&format!("{}/data", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(auth.calls(), 0);
    }

    #[tokio::test]
    async fn post_with_auth_carries_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let (_temp, client, _auth) = harness(vec![cookie("sid", "fresh", "")]);
        let response = client
            .post_with_auth(
                &format!("{}/submit", server.uri()),
                Some("application/json"),
                Some(r#"{"k":1}"#.to_string()),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn invalid_url_fails_before_any_network_use() {
        let err = session_host("not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn cookie_header_joins_matches_in_order() {
        let cookies = vec![
            cookie("a", "1", ""),
            cookie("b", "2", "example.com"),
            cookie("c", "3", "other.com"),
        ];
        assert_eq!(
            cookie_header(&cookies, "app.example.com").unwrap(),
            "a=1; b=2"
        );
        assert_eq!(cookie_header(&[], "app.example.com"), None);
    }
}
