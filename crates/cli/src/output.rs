use colored::{ColoredString, Colorize};
use reqwest::{Response, StatusCode, header};
use ssofetch::Result;

/// Prints the status line and headers to stderr and the body to stdout, so
/// piped output stays clean. JSON bodies are pretty-printed.
pub async fn print_response(response: Response) -> Result<()> {
    eprintln!("{}", format_status(response.status()));
    for (name, value) in response.headers() {
        eprintln!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("json"));

    let body = response.text().await?;
    if body.is_empty() {
        return Ok(());
    }

    if is_json {
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            // Declared JSON but not parseable; show it untouched.
            Err(_) => println!("{body}"),
        }
    } else {
        println!("{body}");
    }

    Ok(())
}

fn format_status(status: StatusCode) -> ColoredString {
    let line = format!(
        "{} {}",
        status.as_str(),
        status.canonical_reason().unwrap_or("")
    );

    if status.is_success() {
        line.green()
    } else if status.is_client_error() || status.is_server_error() {
        line.red()
    } else {
        line.yellow()
    }
}
