use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod chat;
pub mod image;
pub mod render;
pub mod sessions;

use crate::api::ApiClient;
use crate::auth::UserCache;
use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Sign in to the chat service
    Signin {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account on the chat service
    Signup {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Start an interactive chat session
    Chat {},
    /// List chat sessions
    Sessions {
        /// Print the sidebar HTML instead of a table
        #[arg(long, action, default_value = "false")]
        html: bool,
    },
    /// Render markdown from a file (or stdin) to HTML
    Render {
        #[arg(long)]
        file: Option<String>,
    },
    /// Generate an image and save it
    Image {
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value = "image.png")]
        out: String,
    },
    /// Sign out and forget the cached user
    Logout {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the chat service
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        // Keep stdout for the chat itself
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the API client, picking up the session cookie from the last
/// sign in if there is one.
fn connect(config: &AppConfig) -> Result<(ApiClient, UserCache)> {
    let api = ApiClient::new(&config.base_url)?;
    let cache = UserCache::new(&config.user_cache_path);
    if let Some(cookie) = cache.load().and_then(|cached| cached.session_cookie) {
        api.restore_session_cookie(&cookie);
    }
    Ok((api, cache))
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let config = AppConfig::default().with_base_url(args.base_url);

    // Handle each sub command
    match args.command {
        Some(Command::Signin { email }) => {
            let (api, cache) = connect(&config)?;
            auth::sign_in(api, cache, email).await?;
        }
        Some(Command::Signup { username, email }) => {
            let (api, cache) = connect(&config)?;
            auth::sign_up(api, cache, username, email).await?;
        }
        Some(Command::Chat {}) => {
            let (api, cache) = connect(&config)?;
            chat::run(&config, api, cache).await?;
        }
        Some(Command::Sessions { html }) => {
            let (api, _) = connect(&config)?;
            sessions::run(&config, api, html).await?;
        }
        Some(Command::Render { file }) => {
            render::run(file)?;
        }
        Some(Command::Image { prompt, out }) => {
            let (api, _) = connect(&config)?;
            image::run(&config, api, &prompt, &out).await?;
        }
        Some(Command::Logout {}) => {
            let (api, cache) = connect(&config)?;
            auth::logout(api, cache).await?;
        }
        None => {}
    }

    Ok(())
}
