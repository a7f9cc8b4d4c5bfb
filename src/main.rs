//! Strictly Hangman - Unified CLI
//!
//! HTTP server, terminal game, history listing and replay.

#![warn(missing_docs)]

mod cli;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, StoreArgs};
use strictly_hangman::{
    GameRepository, GameService, Playback, ServerConfig, SessionId, frame_caption, render_text,
    serve,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, host, store } => {
            initialize_tracing("info,strictly_hangman=debug");
            run_server(host, port, store).await
        }
        Command::Play { player, store } => {
            initialize_tracing("warn");
            run_play(player, store).await
        }
        Command::History { store } => {
            initialize_tracing("warn");
            run_history(store).await
        }
        Command::Replay {
            id,
            delay_ms,
            store,
        } => {
            initialize_tracing("warn");
            run_replay(SessionId::new(id), delay_ms, store).await
        }
    }
}

fn initialize_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Loads configuration and applies command-line overrides.
fn load_config(
    store: &StoreArgs,
    host: Option<String>,
    port: Option<u16>,
) -> Result<ServerConfig> {
    let config = ServerConfig::load(Some(store.config.as_path()))?;
    Ok(config.with_overrides(host, port, store.db_path.clone()))
}

/// Opens the database and wires the service.
#[instrument(skip(config), fields(db = %config.database_path()))]
fn build_service(config: &ServerConfig) -> Result<GameService> {
    let repository = GameRepository::open(config.database_path().clone())?;
    let vocabulary = config.build_vocabulary()?;
    Ok(
        GameService::new(Arc::new(repository), Arc::new(vocabulary))
            .with_reveal_on_loss(*config.reveal_on_loss()),
    )
}

/// Run the HTTP game server
async fn run_server(host: Option<String>, port: Option<u16>, store: StoreArgs) -> Result<()> {
    let config = load_config(&store, host, port)?;
    info!(?config, "Starting Strictly Hangman server");
    let service = build_service(&config)?;
    serve(service, &config).await
}

/// Play one game on stdin/stdout
async fn run_play(player: String, store: StoreArgs) -> Result<()> {
    let config = load_config(&store, None, None)?;
    let service = build_service(&config)?;

    let view = service.new_game(Some(player)).await?;
    let id = *view.game().id();
    println!("Game #{}", id);
    println!("{}", render_text(view.display()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Letter: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match service.guess(id, &line).await {
            Ok(report) => {
                println!("{} -> {}", report.letter(), report.result());
                println!("{}", render_text(report.display()));
                if report.outcome().is_terminal() {
                    break;
                }
            }
            Err(e) => println!("  {}", e),
        }
    }

    Ok(())
}

/// Print stored games
async fn run_history(store: StoreArgs) -> Result<()> {
    let config = load_config(&store, None, None)?;
    let service = build_service(&config)?;

    let games = service.list_games().await?;
    if games.is_empty() {
        println!("No games yet.");
        return Ok(());
    }

    println!("{:>5}  {:<19}  {:<16}  {:<8}  Outcome", "ID", "Date", "Player", "Word");
    for game in games {
        let word = if game.outcome().is_terminal() {
            game.word().clone()
        } else {
            "****".to_string()
        };
        println!(
            "{:>5}  {:<19}  {:<16}  {:<8}  {}",
            game.id(),
            game.date().format("%Y-%m-%d %H:%M:%S"),
            game.player_name(),
            word,
            game.outcome()
        );
    }
    Ok(())
}

/// Replay a stored game with a delay between steps
async fn run_replay(id: SessionId, delay_ms: Option<u64>, store: StoreArgs) -> Result<()> {
    let config = load_config(&store, None, None)?;
    let service = build_service(&config)?;
    let delay = delay_ms.map_or_else(|| config.replay_delay(), Duration::from_millis);

    let player = service.replay(id).await?;
    println!("Replay of game #{}", id);
    println!("{}", render_text(&player.initial_state()?));

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let end = player
        .play(delay, &cancel, |frame| {
            println!("{}", frame_caption(frame));
            println!("{}", render_text(frame.state()));
        })
        .await;
    watcher.abort();

    match end? {
        Playback::Completed { .. } => println!("Replay finished."),
        Playback::Cancelled { frames } => {
            warn!(frames, "Replay interrupted");
            println!("Replay stopped.");
        }
    }
    Ok(())
}
