use anyhow::Result;
use clap::{Parser, Subcommand};
use convo_core::session::ChatMode;
use std::path::PathBuf;

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "convo")]
#[command(about = "convo - chat session client", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.config/convo/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// List chat sessions
    Sessions,
    /// Show the messages of a session
    History { session_id: String },
    /// Create a new session
    New {
        #[arg(long)]
        title: Option<String>,
    },
    /// Send one message and print the reply
    Send {
        /// Target session; a new one is created when omitted
        #[arg(long)]
        session: Option<String>,
        #[arg(long, default_value = "normal")]
        mode: ChatMode,
        text: String,
    },
    /// Rename a session
    Rename { session_id: String, title: String },
    /// Delete a session
    Delete { session_id: String },
    /// Interactive chat
    Chat {
        /// Session to open on start
        #[arg(long)]
        session: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let app = AppContext::build(cli.config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&app, &username, password).await?
        }
        Commands::Logout => commands::auth::logout(&app)?,
        Commands::Sessions => commands::sessions::list(&app).await?,
        Commands::History { session_id } => commands::sessions::history(&app, &session_id).await?,
        Commands::New { title } => commands::sessions::create(&app, title.as_deref()).await?,
        Commands::Send {
            session,
            mode,
            text,
        } => commands::sessions::send(&app, session.as_deref(), mode, &text).await?,
        Commands::Rename { session_id, title } => {
            commands::sessions::rename(&app, &session_id, &title).await?
        }
        Commands::Delete { session_id } => commands::sessions::delete(&app, &session_id).await?,
        Commands::Chat { session } => commands::repl::run(&app, session.as_deref()).await?,
    }

    Ok(())
}
