use reqwest::StatusCode;
use ssofetch::{FetchClient, Result, session_host};
use tracing::debug;

use crate::output;

pub async fn get(client: &FetchClient, url: &str) -> Result<()> {
    let response = client.get_with_auth(url).await?;
    output::print_response(response).await
}

pub async fn post(
    client: &FetchClient,
    url: &str,
    content_type: &str,
    data: Option<String>,
) -> Result<()> {
    let response = client
        .post_with_auth(url, content_type_for(&data, content_type), data)
        .await?;
    output::print_response(response).await
}

/// PUT self-heals at the call site: the client exposes no `put_with_auth`.
pub async fn put(
    client: &FetchClient,
    url: &str,
    content_type: &str,
    data: Option<String>,
) -> Result<()> {
    ensure_session(client, url).await?;

    let content_type = content_type_for(&data, content_type);
    let mut response = client.put(url, content_type, data.clone()).await?;
    if response.status() == StatusCode::UNAUTHORIZED {
        reauthenticate(client, url).await?;
        response = client.put(url, content_type, data).await?;
    }

    output::print_response(response).await
}

/// DELETE self-heals at the call site, like PUT.
pub async fn delete(client: &FetchClient, url: &str) -> Result<()> {
    ensure_session(client, url).await?;

    let mut response = client.delete(url).await?;
    if response.status() == StatusCode::UNAUTHORIZED {
        reauthenticate(client, url).await?;
        response = client.delete(url).await?;
    }

    output::print_response(response).await
}

fn content_type_for<'a>(data: &Option<String>, content_type: &'a str) -> Option<&'a str> {
    data.as_ref().map(|_| content_type)
}

async fn ensure_session(client: &FetchClient, url: &str) -> Result<()> {
    let host = session_host(url)?;
    if client.cached_cookies(&host)?.is_empty() {
        println!("No session found for {host}, authenticating...");
        client.authenticate(url).await?;
    }
    Ok(())
}

async fn reauthenticate(client: &FetchClient, url: &str) -> Result<()> {
    let host = session_host(url)?;
    debug!(target = "ssofetch", host, "401 response, re-authenticating");
    println!("Session expired for {host}, re-authenticating...");
    client.authenticate(url).await
}
