//! CDP WebSocket client and per-page session handle.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpCookie, CdpRequest, CdpResponse, PageInfo};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

struct PendingRequest {
    tx: oneshot::Sender<Result<Value, CdpError>>,
}

/// Connection to one browser's remote-debugging endpoint.
///
/// Commands are correlated to responses by id; a background task owns the
/// receive half of the socket and is aborted on drop.
pub struct CdpClient {
    http_endpoint: String,
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    request_id: Arc<AtomicU64>,
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connects to the browser behind `endpoint` (e.g. `http://127.0.0.1:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let version = fetch_version(&http_endpoint, None).await?;

        debug!(
            browser = version.browser.as_deref().unwrap_or("unknown"),
            "connecting to browser WebSocket"
        );

        let (ws_stream, _) =
            tokio_tungstenite::connect_async(&version.web_socket_debugger_url).await?;
        let (ws_sink, ws_source) = ws_stream.split();

        let ws_tx = Arc::new(tokio::sync::Mutex::new(ws_sink));
        let pending: Arc<Mutex<HashMap<u64, PendingRequest>>> = Arc::new(Mutex::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            tokio::spawn(async move {
                receive_loop(ws_source, pending).await;
            })
        };

        Ok(Self {
            http_endpoint,
            ws_tx,
            request_id: Arc::new(AtomicU64::new(1)),
            pending,
            _recv_task: recv_task,
        })
    }

    /// Sends a browser-level CDP command and waits for its response.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        dispatch_call(&self.ws_tx, &self.pending, &self.request_id, method, params, None).await
    }

    /// Opens a new tab at `url` and attaches a session to it.
    pub async fn open_page(&self, url: &str) -> Result<PageSession, CdpError> {
        // Chrome requires PUT for /json/new.
        let create_url = format!("{}/json/new?{}", self.http_endpoint, url);
        let info: PageInfo = reqwest::Client::new()
            .put(&create_url)
            .send()
            .await?
            .json()
            .await?;
        debug!(target_id = %info.id, url = %info.url, "opened page");

        self.attach(&info.id).await
    }

    /// Attaches a flattened session to an existing target.
    pub async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("missing sessionId".into()))?
            .to_string();

        let session = PageSession {
            target_id: target_id.to_string(),
            session_id,
            ws_tx: self.ws_tx.clone(),
            pending: self.pending.clone(),
            request_id: self.request_id.clone(),
        };

        session.call("Page.enable", None).await?;
        session.call("Runtime.enable", None).await?;

        Ok(session)
    }

    /// Retrieves the browser's complete cookie jar.
    ///
    /// Browser-level on purpose: host-only and secure SSO cookies are not
    /// enumerable from page context.
    pub async fn all_cookies(&self) -> Result<Vec<CdpCookie>, CdpError> {
        let result = self.call("Storage.getCookies", None).await?;
        let cookies = serde_json::from_value(result["cookies"].clone())?;
        Ok(cookies)
    }

    /// Closes a tab. The browser itself stays up.
    pub async fn close_page(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({ "targetId": target_id })))
            .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

/// Session attached to a single page target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    request_id: Arc<AtomicU64>,
}

impl PageSession {
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Sends a CDP command scoped to this page's session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        dispatch_call(
            &self.ws_tx,
            &self.pending,
            &self.request_id,
            method,
            params,
            Some(&self.session_id),
        )
        .await
    }

    /// Evaluates a JavaScript expression in page context by value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Reads the page's current location via target introspection.
    ///
    /// Not script evaluation: `Runtime.evaluate` fails transiently while a
    /// navigation commits, and this is polled exactly when the page is
    /// bouncing through redirects.
    pub async fn current_url(&self) -> Result<String, CdpError> {
        let result = self
            .call(
                "Target.getTargetInfo",
                Some(json!({ "targetId": self.target_id })),
            )
            .await?;

        result["targetInfo"]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("missing targetInfo.url".into()))
    }
}

/// Probes `/json/version`, optionally with a short liveness timeout.
pub(crate) async fn fetch_version(
    http_endpoint: &str,
    timeout: Option<Duration>,
) -> Result<BrowserVersion, CdpError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    let url = format!("{}/json/version", http_endpoint.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|_| CdpError::BrowserNotAvailable(http_endpoint.to_string()))?;

    if !response.status().is_success() {
        return Err(CdpError::BrowserNotAvailable(format!(
            "{http_endpoint}: status {}",
            response.status()
        )));
    }

    Ok(response.json().await?)
}

async fn dispatch_call(
    ws_tx: &tokio::sync::Mutex<WsSink>,
    pending: &Mutex<HashMap<u64, PendingRequest>>,
    request_id: &AtomicU64,
    method: &str,
    params: Option<Value>,
    session_id: Option<&str>,
) -> Result<Value, CdpError> {
    let id = request_id.fetch_add(1, Ordering::SeqCst);
    let request = CdpRequest {
        id,
        method: method.to_string(),
        params,
        session_id: session_id.map(str::to_string),
    };

    let json = serde_json::to_string(&request)?;
    trace!(%json, "CDP send");

    let (tx, rx) = oneshot::channel();
    pending.lock().insert(id, PendingRequest { tx });

    {
        let mut ws = ws_tx.lock().await;
        ws.send(Message::Text(json.into())).await?;
    }

    match tokio::time::timeout(CALL_TIMEOUT, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(CdpError::SessionClosed),
        Err(_) => {
            pending.lock().remove(&id);
            Err(CdpError::Timeout(format!("request {method} timed out")))
        }
    }
}

async fn receive_loop(mut ws_source: WsSource, pending: Arc<Mutex<HashMap<u64, PendingRequest>>>) {
    while let Some(msg) = ws_source.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                trace!(%text, "CDP recv");
                match serde_json::from_str::<CdpResponse>(&text) {
                    Ok(resp) => {
                        if let Some(id) = resp.id {
                            let req = pending.lock().remove(&id);
                            if let Some(req) = req {
                                let result = match resp.error {
                                    Some(error) => Err(CdpError::Protocol {
                                        code: error.code,
                                        message: error.message,
                                    }),
                                    None => Ok(resp.result.unwrap_or(Value::Null)),
                                };
                                let _ = req.tx.send(result);
                            }
                        } else if resp.method.is_some() {
                            // Unsubscribed event; ignore.
                        }
                    }
                    Err(err) => warn!(%err, "unparseable CDP message"),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("browser WebSocket closed");
                break;
            }
            Err(err) => {
                warn!(%err, "browser WebSocket error");
                break;
            }
            _ => {}
        }
    }
    // Outstanding calls observe SessionClosed when their senders drop here.
    pending.lock().clear();
}
