//! Game service: the business layer between transports and the store.
//!
//! Live sessions are not kept in memory. Each guess restores the session
//! from its move log, applies the guess, and appends the resulting move,
//! all while holding that session's lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, DbErrorKind};
use crate::games::hangman::{
    DisplayState, GameError, GuessResult, Move, Outcome, Session, SessionId, WordSource,
    parse_letter,
};
use crate::move_log::next_step;
use crate::replay::ReplayPlayer;
use crate::store::{GameRecord, SessionStore, StoreError};

/// Player name used when a new game does not name one.
pub const DEFAULT_PLAYER_NAME: &str = "Unknown";

/// Error returned by [`GameService`] operations.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ServiceError {
    /// The guess or game data was rejected by the rules.
    #[display("{}", _0)]
    Game(GameError),
    /// The store rejected or failed the operation.
    #[display("{}", _0)]
    Store(StoreError),
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Game(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        Self::Game(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// A game together with its current display state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    game: GameRecord,
    display: DisplayState,
}

/// Result of an accepted guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GuessReport {
    step_number: u32,
    letter: char,
    result: GuessResult,
    outcome: Outcome,
    display: DisplayState,
}

type LockTable = Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>;

/// Removes a session's lock entry on drop once only the table references it.
///
/// Entries are cloned only while the table is locked, so a count of one
/// means no caller holds or waits on the session.
struct LockLease<'a> {
    locks: &'a LockTable,
    id: SessionId,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.locks.lock()
            && locks
                .get(&self.id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

/// Orchestrates word selection, session rules and persistence.
#[derive(Debug, Clone)]
pub struct GameService {
    store: Arc<dyn SessionStore>,
    words: Arc<dyn WordSource>,
    locks: Arc<LockTable>,
    reveal_on_loss: bool,
}

impl GameService {
    /// Creates a service over the given store and word source.
    #[instrument(skip(store, words))]
    pub fn new(store: Arc<dyn SessionStore>, words: Arc<dyn WordSource>) -> Self {
        info!("Creating GameService");
        Self {
            store,
            words,
            locks: Arc::new(Mutex::new(HashMap::new())),
            reveal_on_loss: true,
        }
    }

    /// Sets whether lost games reveal the word in live display states.
    pub fn with_reveal_on_loss(mut self, reveal: bool) -> Self {
        self.reveal_on_loss = reveal;
        self
    }

    /// Runs a store call on the blocking thread pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SessionStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| {
                warn!(error = %e, "Store task failed");
                StoreError::Unavailable(DbError::new(
                    DbErrorKind::Internal,
                    format!("Store task failed: {}", e),
                ))
            })?
            .map_err(ServiceError::from)
    }

    /// Returns the lock that serializes writes to one session.
    fn session_lock(&self, id: SessionId) -> Result<Arc<tokio::sync::Mutex<()>>, ServiceError> {
        let mut locks = self.locks.lock().map_err(|_| {
            StoreError::Unavailable(DbError::new(
                DbErrorKind::Poisoned,
                "session lock table poisoned",
            ))
        })?;
        Ok(Arc::clone(locks.entry(id).or_default()))
    }

    /// Loads a game and its moves, failing with `NotFound` for unknown ids.
    async fn load(&self, id: SessionId) -> Result<(GameRecord, Vec<Move>), ServiceError> {
        self.blocking(move |store| {
            let game = store.get_game(id)?.ok_or(StoreError::NotFound(id))?;
            let moves = store.list_steps(id)?;
            Ok((game, moves))
        })
        .await
    }

    /// Starts a new game with a random word.
    ///
    /// A missing or blank name becomes [`DEFAULT_PLAYER_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the game cannot be stored.
    #[instrument(skip(self))]
    pub async fn new_game(&self, player_name: Option<String>) -> Result<GameView, ServiceError> {
        let player_name = player_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());

        let word = self.words.pick_word();
        let session = Session::create(&word)?;
        let word = session.target_word();

        let game = self
            .blocking(move |store| store.create_game(&player_name, &word))
            .await?;

        info!(game_id = %game.id(), player = %game.player_name(), "New game started");
        Ok(GameView {
            game,
            display: session.render(self.reveal_on_loss),
        })
    }

    /// Applies a guess to a stored game and records the move.
    ///
    /// The move and, when the guess ends the game, the final outcome are
    /// stored together. A rejected or failed guess stores nothing.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Game`] for malformed, duplicate or late guesses.
    /// - [`ServiceError::Store`] for unknown ids and store failures.
    #[instrument(skip(self))]
    pub async fn guess(&self, id: SessionId, letter: &str) -> Result<GuessReport, ServiceError> {
        let letter = parse_letter(letter)?;

        // Declared first so it drops last, after the guard.
        let _lease = LockLease {
            locks: &self.locks,
            id,
        };
        let _guard = self.session_lock(id)?.lock_owned().await;
        self.apply_guess(id, letter).await
    }

    /// Restores the session, applies the guess and records the move. Callers
    /// hold the session lock.
    async fn apply_guess(&self, id: SessionId, letter: char) -> Result<GuessReport, ServiceError> {
        let (game, moves) = self.load(id).await?;
        let mut session = Session::restore(game.word(), &moves)?;
        let applied = session.guess(letter)?;

        let mv = Move::new(
            next_step(moves.last().map(|m| m.step_number)),
            letter,
            applied.result,
            applied.outcome,
        );
        self.blocking(move |store| store.record_move(id, &mv)).await?;

        if applied.outcome.is_terminal() {
            info!(outcome = %applied.outcome, steps = mv.step_number, "Game finished");
        } else {
            debug!(step = mv.step_number, result = %applied.result, "Guess recorded");
        }

        Ok(GuessReport {
            step_number: mv.step_number,
            letter,
            result: applied.result,
            outcome: applied.outcome,
            display: session.render(self.reveal_on_loss),
        })
    }

    /// Returns a game and its current display state.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for unknown ids, store failures, or a move
    /// log the rules reject.
    #[instrument(skip(self))]
    pub async fn game(&self, id: SessionId) -> Result<GameView, ServiceError> {
        let (game, moves) = self.load(id).await?;
        let session = Session::restore(game.word(), &moves)?;
        Ok(GameView {
            display: session.render(self.reveal_on_loss),
            game,
        })
    }

    /// Lists all games, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] on store failure.
    #[instrument(skip(self))]
    pub async fn list_games(&self) -> Result<Vec<GameRecord>, ServiceError> {
        let games = self.blocking(|store| store.list_games()).await?;
        debug!(count = games.len(), "Games listed");
        Ok(games)
    }

    /// Returns the moves of a game in step order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] for unknown ids and store failures.
    #[instrument(skip(self))]
    pub async fn steps(&self, id: SessionId) -> Result<Vec<Move>, ServiceError> {
        let (_, moves) = self.load(id).await?;
        Ok(moves)
    }

    /// Builds a replay player for a stored game. Frames use the same reveal
    /// setting as live play, so they match the live display states.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] for unknown ids and store failures.
    #[instrument(skip(self))]
    pub async fn replay(&self, id: SessionId) -> Result<ReplayPlayer, ServiceError> {
        let (game, moves) = self.load(id).await?;
        Ok(ReplayPlayer::new(game.word().clone(), moves).with_reveal_on_loss(self.reveal_on_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::hangman::FixedWord;
    use crate::store::MemoryStore;

    fn service(word: &str) -> GameService {
        GameService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedWord::new(word).unwrap()),
        )
    }

    fn lock_entries(service: &GameService) -> usize {
        service.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_unknown_ids_leave_no_lock_entries() {
        let service = service("ДА");
        for raw in 1000..2000 {
            let err = service.guess(SessionId::new(raw), "Д").await.unwrap_err();
            assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
        }
        assert_eq!(lock_entries(&service), 0);
    }

    #[tokio::test]
    async fn test_finished_and_running_games_leave_no_lock_entries() {
        let service = service("ДА");
        let finished = *service.new_game(None).await.unwrap().game().id();
        service.guess(finished, "Д").await.unwrap();
        service.guess(finished, "А").await.unwrap();
        for letter in ["Б", "В", "Г"] {
            assert!(service.guess(finished, letter).await.is_err());
        }

        let running = *service.new_game(None).await.unwrap().game().id();
        service.guess(running, "Я").await.unwrap();

        assert_eq!(lock_entries(&service), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_guesses_leave_no_lock_entries() {
        let service = service("СЕРВЕР");
        let id = *service.new_game(None).await.unwrap().game().id();

        let handles: Vec<_> = ["С", "Е", "Я", "Ю", "Э"]
            .into_iter()
            .map(|letter| {
                let service = service.clone();
                tokio::spawn(async move { service.guess(id, letter).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.steps(id).await.unwrap().len(), 5);
        assert_eq!(lock_entries(&service), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_guess_leaves_no_lock_entry() {
        let service = service("ДА");
        let id = *service.new_game(None).await.unwrap().game().id();

        let holder = LockLease {
            locks: &service.locks,
            id,
        };
        let held = service.session_lock(id).unwrap().lock_owned().await;

        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            service.guess(id, "Д"),
        )
        .await;
        assert!(waiting.is_err());
        assert_eq!(lock_entries(&service), 1);

        drop(held);
        drop(holder);
        assert_eq!(lock_entries(&service), 0);
        assert!(service.steps(id).await.unwrap().is_empty());
    }
}
