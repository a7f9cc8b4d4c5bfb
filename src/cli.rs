//! Command-line interface for strictly_hangman.

use clap::{Args, Parser, Subcommand};

/// Strictly Hangman - hangman game server with replayable history
#[derive(Parser, Debug)]
#[command(name = "strictly_hangman")]
#[command(about = "Hangman game server with replayable history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that touches the database.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to the SQLite database (created if it doesn't exist)
    #[arg(long)]
    pub db_path: Option<String>,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "hangman.toml")]
    pub config: std::path::PathBuf,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Play a game in the terminal
    Play {
        /// Player name recorded with the game
        #[arg(long, default_value = "Player")]
        player: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// List stored games, most recent first
    History {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Replay a stored game step by step (Ctrl+C stops)
    Replay {
        /// Game id
        id: i32,

        /// Delay between steps in milliseconds (defaults to the configured delay)
        #[arg(long)]
        delay_ms: Option<u64>,

        #[command(flatten)]
        store: StoreArgs,
    },
}
