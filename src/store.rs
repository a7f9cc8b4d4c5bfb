//! Session store contract and its implementations.
//!
//! The store keeps game summaries and their move logs. [`GameRepository`]
//! persists to SQLite; [`MemoryStore`] keeps everything in process.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, DbErrorKind, GameRepository};
use crate::games::hangman::{Move, Outcome, SessionId};
use crate::move_log::{MoveLog, OutOfOrder};

/// Stored summary of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    id: SessionId,
    date: NaiveDateTime,
    player_name: String,
    word: String,
    outcome: Outcome,
}

/// Failure reported by a [`SessionStore`].
#[derive(Debug, Clone, derive_more::Display)]
pub enum StoreError {
    /// No game with this id.
    #[display("Game {} not found", _0)]
    NotFound(SessionId),

    /// A move did not directly follow the last stored step.
    #[display("{}", _0)]
    OutOfOrder(OutOfOrder),

    /// The backing storage failed.
    #[display("Store unavailable: {}", _0)]
    Unavailable(DbError),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::OutOfOrder(e) => Some(e),
            Self::Unavailable(e) => Some(e),
        }
    }
}

impl From<OutOfOrder> for StoreError {
    fn from(err: OutOfOrder) -> Self {
        Self::OutOfOrder(err)
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::Unavailable(err)
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::Unavailable(DbError::from(err))
    }
}

/// Persistence contract for games and move logs.
///
/// Implementations are synchronous; async callers run them on a blocking
/// thread.
pub trait SessionStore: std::fmt::Debug + Send + Sync {
    /// Stores a new game in the `PLAYING` state.
    fn create_game(&self, player_name: &str, word: &str) -> Result<GameRecord, StoreError>;

    /// Returns a game, or `None` if the id is unknown.
    fn get_game(&self, id: SessionId) -> Result<Option<GameRecord>, StoreError>;

    /// Returns all games, most recent first.
    fn list_games(&self) -> Result<Vec<GameRecord>, StoreError>;

    /// Appends a move to a game's log.
    fn append_step(&self, id: SessionId, mv: &Move) -> Result<(), StoreError>;

    /// Appends a move and, if the move ends the game, sets the game's
    /// outcome. Both happen or neither does.
    fn record_move(&self, id: SessionId, mv: &Move) -> Result<(), StoreError>;

    /// Sets a game's outcome.
    fn update_outcome(&self, id: SessionId, outcome: Outcome) -> Result<(), StoreError>;

    /// Returns a game's moves in step order.
    fn list_steps(&self, id: SessionId) -> Result<Vec<Move>, StoreError>;
}

impl SessionStore for GameRepository {
    fn create_game(&self, player_name: &str, word: &str) -> Result<GameRecord, StoreError> {
        Ok(GameRepository::create_game(self, player_name, word)?)
    }

    fn get_game(&self, id: SessionId) -> Result<Option<GameRecord>, StoreError> {
        Ok(GameRepository::get_game(self, id)?)
    }

    fn list_games(&self) -> Result<Vec<GameRecord>, StoreError> {
        Ok(GameRepository::list_games(self)?)
    }

    fn append_step(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        GameRepository::append_step(self, id, mv)
    }

    fn record_move(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        GameRepository::record_move(self, id, mv)
    }

    fn update_outcome(&self, id: SessionId, outcome: Outcome) -> Result<(), StoreError> {
        GameRepository::update_outcome(self, id, outcome)
    }

    fn list_steps(&self, id: SessionId) -> Result<Vec<Move>, StoreError> {
        Ok(GameRepository::list_steps(self, id)?)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    games: BTreeMap<SessionId, GameRecord>,
    log: MoveLog,
    last_id: i32,
}

/// In-process store backed by a [`MoveLog`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating MemoryStore");
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| {
            warn!("Memory store lock poisoned");
            StoreError::Unavailable(DbError::new(
                DbErrorKind::Poisoned,
                "memory store lock poisoned",
            ))
        })
    }
}

impl SessionStore for MemoryStore {
    #[instrument(skip(self, word))]
    fn create_game(&self, player_name: &str, word: &str) -> Result<GameRecord, StoreError> {
        let mut state = self.state()?;
        state.last_id += 1;
        let id = SessionId::new(state.last_id);
        let record = GameRecord::new(
            id,
            Utc::now().naive_utc(),
            player_name.to_string(),
            word.to_string(),
            Outcome::Playing,
        );
        state.games.insert(id, record.clone());
        debug!(%id, "Game created");
        Ok(record)
    }

    fn get_game(&self, id: SessionId) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.state()?.games.get(&id).cloned())
    }

    fn list_games(&self) -> Result<Vec<GameRecord>, StoreError> {
        Ok(self.state()?.games.values().rev().cloned().collect())
    }

    #[instrument(skip(self, mv), fields(step = mv.step_number))]
    fn append_step(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if !state.games.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        state.log.append(id, *mv)?;
        Ok(())
    }

    #[instrument(skip(self, mv), fields(step = mv.step_number, outcome = %mv.outcome_after))]
    fn record_move(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        let record = state.games.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        state.log.append(id, *mv)?;
        if mv.outcome_after.is_terminal() {
            record.outcome = mv.outcome_after;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn update_outcome(&self, id: SessionId, outcome: Outcome) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let record = state.games.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.outcome = outcome;
        Ok(())
    }

    fn list_steps(&self, id: SessionId) -> Result<Vec<Move>, StoreError> {
        Ok(self.state()?.log.list(id))
    }
}
