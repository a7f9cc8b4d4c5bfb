//! Strictly Hangman library - hangman game server with move history and replay
//!
//! # Architecture
//!
//! - **Games**: word source, session state machine and display projection
//! - **Move log**: append-only, strictly ordered per-session history
//! - **Replay**: recomputed display states with cancelable pacing
//! - **Store**: persistence contract with SQLite and in-memory backends
//! - **Service**: per-session serialized game operations
//! - **Server**: JSON HTTP API over the service
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_hangman::{GameService, MemoryStore, Vocabulary};
//!
//! # async fn example() -> Result<(), strictly_hangman::ServiceError> {
//! let service = GameService::new(Arc::new(MemoryStore::new()), Arc::new(Vocabulary::default()));
//! let view = service.new_game(Some("Anna".to_string())).await?;
//! let report = service.guess(*view.game().id(), "е").await?;
//! println!("{:?}", report.result());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod games;
mod move_log;
mod presentation;
mod replay;
mod server;
mod service;
mod store;

// Crate-level exports - Game types
pub use games::hangman::{
    ALPHABET, Cell, DEFAULT_WORDS, DisplayState, FixedWord, GameError, GuessOutcome, GuessResult,
    Key, KeyStatus, MAX_MISTAKES, Move, Outcome, Session, SessionId, Vocabulary, WordSource,
    normalize_letter, normalize_word, parse_letter,
};

// Crate-level exports - Move log
pub use move_log::{MoveLog, OutOfOrder, check_step, next_step};

// Crate-level exports - Replay
pub use replay::{DEFAULT_REPLAY_DELAY, Playback, Replay, ReplayFrame, ReplayPlayer};

// Crate-level exports - Persistence
pub use db::{
    DbError, DbErrorKind, GameRepository, GameRow, MIGRATIONS, NewGameRow, NewStepRow, StepRow,
};
pub use store::{GameRecord, MemoryStore, SessionStore, StoreError};

// Crate-level exports - Service
pub use service::{DEFAULT_PLAYER_NAME, GameService, GameView, GuessReport, ServiceError};

// Crate-level exports - Server
pub use server::{
    AppError, AppState, GameResponse, GameSummary, GuessRequest, HealthResponse,
    NewGameRequest, ReplayResponse, create_router, serve,
};

// Crate-level exports - Configuration
pub use config::{ConfigError, DATABASE_URL_ENV, ServerConfig};

// Crate-level exports - Presentation
pub use presentation::{
    GALLOWS, frame_caption, gallows, keyboard_lines, outcome_banner, render_text, word_line,
};
