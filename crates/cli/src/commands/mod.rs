mod auth;
mod request;
mod status;
mod token;

use ssofetch::{BrowserKind, FetchClient, Result};

use crate::cli::Commands;

pub async fn dispatch(command: Commands, browser: BrowserKind) -> Result<()> {
    let client = FetchClient::new(browser)?;

    match command {
        Commands::Auth { url } => auth::execute(&client, &url).await,
        Commands::Get { url } => request::get(&client, &url).await,
        Commands::Post { url, data, content_type } => {
            request::post(&client, &url, &content_type, data).await
        }
        Commands::Put { url, data, content_type } => {
            request::put(&client, &url, &content_type, data).await
        }
        Commands::Delete { url } => request::delete(&client, &url).await,
        Commands::Status => status::execute(&client),
        Commands::Token { url } => token::execute(&client, &url).await,
    }
}
