//! Mordomo CLI — the main entry point.
//!
//! Commands:
//! - `run`          — Start the Telegram bot (long polling)
//! - `chat`         — Send one message locally, without Telegram
//! - `set-commands` — Register the slash-command menu with Telegram
//! - `onboard`      — Write a default config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "mordomo",
    about = "Mordomo — a Telegram butler bot backed by Gemini",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot
    Run,

    /// Send a single message to the model locally (no Telegram)
    Chat {
        /// The message to send
        message: String,
    },

    /// Register the slash-command menu with Telegram
    SetCommands,

    /// Write a default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run => commands::run::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::SetCommands => commands::set_commands::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
