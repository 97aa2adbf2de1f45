use clap::{Parser, Subcommand, ValueEnum};

use ssofetch::BrowserKind;

#[derive(Parser, Debug)]
#[command(name = "ssofetch")]
#[command(about = "Browser-assisted SSO authentication and authenticated HTTP requests")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Browser used for interactive logins
    #[arg(short, long, global = true, value_enum, default_value = "edge")]
    pub browser: BrowserArg,

    #[command(subcommand)]
    pub command: Commands,
}

/// Browser choice as exposed on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum BrowserArg {
    #[default]
    Edge,
    Chrome,
}

impl From<BrowserArg> for BrowserKind {
    fn from(arg: BrowserArg) -> Self {
        match arg {
            BrowserArg::Edge => BrowserKind::Edge,
            BrowserArg::Chrome => BrowserKind::Chrome,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Force a fresh interactive login and cache the session
    Auth { url: String },

    /// GET with cached session cookies, authenticating on demand
    #[command(name = "GET")]
    Get { url: String },

    /// POST with cached session cookies, authenticating on demand
    #[command(name = "POST")]
    Post {
        url: String,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
        /// Content-Type sent with --data
        #[arg(long, default_value = "application/json")]
        content_type: String,
    },

    /// PUT with cached session cookies, authenticating on demand
    #[command(name = "PUT")]
    Put {
        url: String,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
        /// Content-Type sent with --data
        #[arg(long, default_value = "application/json")]
        content_type: String,
    },

    /// DELETE with cached session cookies, authenticating on demand
    #[command(name = "DELETE")]
    Delete { url: String },

    /// List hosts with a cached session
    Status,

    /// Log in and print captured credentials as KEY=value lines
    Token { url: String },
}
