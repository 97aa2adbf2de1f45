use ssofetch::token::{format_token_output, parse_auth0_token};
use ssofetch::{FetchClient, Result};
use tracing::debug;

/// Runs the capture login flow and prints the credentials as KEY=value lines
/// on stdout. A missing Auth0 cache entry is not fatal; cookies alone are
/// still worth printing.
pub async fn execute(client: &FetchClient, url: &str) -> Result<()> {
    let capture = client.authenticate_and_capture(url).await?;

    let jwt = match parse_auth0_token(&capture.local_storage) {
        Ok(token) => token,
        Err(err) => {
            debug!(target = "ssofetch", %err, "no usable Auth0 cache entry");
            String::new()
        }
    };

    let out = format_token_output(&jwt, &capture.cookies);
    if out.is_empty() {
        println!("No credentials captured.");
    } else {
        println!("{out}");
    }

    Ok(())
}
