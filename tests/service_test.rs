//! Tests for the game service over the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use strictly_hangman::{
    Cell, DEFAULT_PLAYER_NAME, DbError, DbErrorKind, FixedWord, GameError, GameRecord,
    GameService, GuessResult, MemoryStore, Move, Outcome, Playback, ServiceError, SessionId,
    SessionStore, StoreError,
};

/// Memory store whose first write of a final outcome fails. Standalone
/// outcome updates always fail.
#[derive(Debug, Default)]
struct FailingOutcomeStore {
    inner: MemoryStore,
    failed_once: AtomicBool,
}

impl FailingOutcomeStore {
    fn unavailable() -> StoreError {
        StoreError::Unavailable(DbError::new(DbErrorKind::Query, "disk I/O error"))
    }
}

impl SessionStore for FailingOutcomeStore {
    fn create_game(&self, player_name: &str, word: &str) -> Result<GameRecord, StoreError> {
        self.inner.create_game(player_name, word)
    }

    fn get_game(&self, id: SessionId) -> Result<Option<GameRecord>, StoreError> {
        self.inner.get_game(id)
    }

    fn list_games(&self) -> Result<Vec<GameRecord>, StoreError> {
        self.inner.list_games()
    }

    fn append_step(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        self.inner.append_step(id, mv)
    }

    fn record_move(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        if mv.outcome_after.is_terminal() && !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.record_move(id, mv)
    }

    fn update_outcome(&self, _id: SessionId, _outcome: Outcome) -> Result<(), StoreError> {
        Err(Self::unavailable())
    }

    fn list_steps(&self, id: SessionId) -> Result<Vec<Move>, StoreError> {
        self.inner.list_steps(id)
    }
}

fn service_with_word(word: &str) -> GameService {
    let words = FixedWord::new(word).expect("Valid word");
    GameService::new(Arc::new(MemoryStore::new()), Arc::new(words))
}

async fn start(service: &GameService, player: &str) -> SessionId {
    let view = service
        .new_game(Some(player.to_string()))
        .await
        .expect("New game failed");
    *view.game().id()
}

#[tokio::test]
async fn test_new_game_defaults() {
    let service = service_with_word("СЕРВЕР");
    let view = service.new_game(None).await.expect("New game failed");

    assert_eq!(view.game().player_name(), DEFAULT_PLAYER_NAME);
    assert_eq!(*view.game().outcome(), Outcome::Playing);
    assert_eq!(view.display().masked_word(), "______");
    assert_eq!(*view.display().mistakes(), 0);

    let blank = service
        .new_game(Some("   ".to_string()))
        .await
        .expect("New game failed");
    assert_eq!(blank.game().player_name(), DEFAULT_PLAYER_NAME);
}

#[tokio::test]
async fn test_winning_game_is_logged_and_stored() {
    let service = service_with_word("СЕРВЕР");
    let id = start(&service, "Anna").await;

    let mut last = None;
    for (i, letter) in ["е", "с", "р", "в"].into_iter().enumerate() {
        let report = service.guess(id, letter).await.expect("Guess failed");
        assert_eq!(*report.step_number() as usize, i + 1);
        assert_eq!(*report.result(), GuessResult::Hit);
        last = Some(report);
    }

    let last = last.expect("At least one guess");
    assert_eq!(*last.outcome(), Outcome::Won);
    assert_eq!(last.display().masked_word(), "СЕРВЕР");

    let steps = service.steps(id).await.expect("Steps failed");
    let letters: String = steps.iter().map(|m| m.letter).collect();
    assert_eq!(letters, "ЕСРВ");
    assert_eq!(steps.last().map(|m| m.outcome_after), Some(Outcome::Won));

    let games = service.list_games().await.expect("List failed");
    assert_eq!(*games[0].outcome(), Outcome::Won);
}

#[tokio::test]
async fn test_losing_game_reveals_word() {
    let service = service_with_word("КЛИЕНТ");
    let id = start(&service, "Boris").await;

    for letter in ["А", "О", "У", "Ы", "Ъ"] {
        let report = service.guess(id, letter).await.expect("Guess failed");
        assert_eq!(*report.outcome(), Outcome::Playing);
    }
    let last = service.guess(id, "Ю").await.expect("Guess failed");
    assert_eq!(*last.outcome(), Outcome::Lost);
    assert_eq!(*last.display().mistakes(), 6);
    assert!(last.display().cells().iter().all(|c| matches!(c, Cell::Missed(_))));

    let view = service.game(id).await.expect("Game failed");
    assert_eq!(*view.game().outcome(), Outcome::Lost);
}

#[tokio::test]
async fn test_hidden_word_on_loss_when_reveal_disabled() {
    let words = FixedWord::new("БАЙТЫ").expect("Valid word");
    let service = GameService::new(Arc::new(MemoryStore::new()), Arc::new(words))
        .with_reveal_on_loss(false);
    let id = start(&service, "Vera").await;

    let mut last = None;
    for letter in ["О", "У", "Э", "Ю", "Я", "Щ"] {
        last = Some(service.guess(id, letter).await.expect("Guess failed"));
    }
    let last = last.expect("At least one guess");
    assert_eq!(*last.outcome(), Outcome::Lost);
    assert!(last.display().cells().iter().all(|c| *c == Cell::Blank));
}

#[tokio::test]
async fn test_guess_after_end_is_rejected() {
    let service = service_with_word("ФАЙЛЫ");
    let id = start(&service, "Gleb").await;
    for letter in ["Ф", "А", "Й", "Л", "Ы"] {
        service.guess(id, letter).await.expect("Guess failed");
    }

    let err = service.guess(id, "Б").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Game(GameError::SessionTerminated(Outcome::Won))
    ));
    assert_eq!(service.steps(id).await.expect("Steps failed").len(), 5);
}

#[tokio::test]
async fn test_rejected_guesses_are_not_logged() {
    let service = service_with_word("ПАРОЛЬ");
    let id = start(&service, "Dina").await;
    service.guess(id, "П").await.expect("Guess failed");

    assert!(matches!(
        service.guess(id, "п").await,
        Err(ServiceError::Game(GameError::DuplicateGuess('П')))
    ));
    assert!(matches!(
        service.guess(id, "").await,
        Err(ServiceError::Game(GameError::InvalidInput(_)))
    ));
    assert!(matches!(
        service.guess(id, "ab").await,
        Err(ServiceError::Game(GameError::InvalidInput(_)))
    ));
    assert!(matches!(
        service.guess(id, "7").await,
        Err(ServiceError::Game(GameError::InvalidInput(_)))
    ));

    assert_eq!(service.steps(id).await.expect("Steps failed").len(), 1);
}

#[tokio::test]
async fn test_unknown_game() {
    let service = service_with_word("ДОМЕНЫ");
    let missing = SessionId::new(404);

    assert!(matches!(
        service.guess(missing, "Д").await,
        Err(ServiceError::Store(StoreError::NotFound(_)))
    ));
    assert!(matches!(
        service.game(missing).await,
        Err(ServiceError::Store(StoreError::NotFound(_)))
    ));
    assert!(matches!(
        service.replay(missing).await,
        Err(ServiceError::Store(StoreError::NotFound(_)))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_guesses_keep_steps_contiguous() {
    let service = service_with_word("ПРОЕКТ");
    let id = start(&service, "Egor").await;

    let mut handles = Vec::new();
    for letter in ["П", "Р", "О", "Я", "Ю"] {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.guess(id, letter).await }));
    }
    for handle in handles {
        handle.await.expect("Task panicked").expect("Guess failed");
    }

    let steps = service.steps(id).await.expect("Steps failed");
    let numbers: Vec<u32> = steps.iter().map(|m| m.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

    let view = service.game(id).await.expect("Game failed");
    assert_eq!(*view.display().mistakes(), 2);
}

#[tokio::test]
async fn test_games_are_independent() {
    let service = service_with_word("СКРИПТ");
    let first = start(&service, "Zhanna").await;
    let second = start(&service, "Ilya").await;

    service.guess(first, "С").await.expect("Guess failed");
    service.guess(second, "Я").await.expect("Guess failed");

    assert_eq!(*service.game(first).await.expect("Game failed").display().mistakes(), 0);
    assert_eq!(*service.game(second).await.expect("Game failed").display().mistakes(), 1);

    let games = service.list_games().await.expect("List failed");
    assert_eq!(games.len(), 2);
    assert_eq!(*games[0].id(), second);
}

#[tokio::test]
async fn test_replay_matches_live_display_states() {
    let service = service_with_word("КЛИЕНТ");
    let id = start(&service, "Kira").await;

    let mut live = Vec::new();
    for letter in ["К", "А", "Л", "О", "У", "Ы", "Ъ", "Ю"] {
        let report = service.guess(id, letter).await.expect("Guess failed");
        live.push(report.display().clone());
    }

    let player = service.replay(id).await.expect("Replay failed");
    let frames = player.collect_frames().expect("Frames failed");
    let replayed: Vec<_> = frames.iter().map(|f| f.state().clone()).collect();
    assert_eq!(replayed, live);
    assert_eq!(*frames.last().expect("Frames").state().outcome(), Outcome::Lost);
}

#[tokio::test(start_paused = true)]
async fn test_replay_playback_through_service() {
    let service = service_with_word("БАЙТЫ");
    let id = start(&service, "Lev").await;
    for letter in ["Б", "А", "Й"] {
        service.guess(id, letter).await.expect("Guess failed");
    }

    let player = service.replay(id).await.expect("Replay failed");
    let cancel = CancellationToken::new();
    let mut shown = Vec::new();
    let playback = player
        .play(std::time::Duration::from_millis(800), &cancel, |frame| {
            shown.push(*frame.letter());
        })
        .await
        .expect("Playback failed");

    assert_eq!(playback, Playback::Completed { frames: 3 });
    assert_eq!(shown, vec!['Б', 'А', 'Й']);
}

#[tokio::test]
async fn test_failed_final_move_leaves_game_playable() {
    let words = FixedWord::new("ДА").expect("Valid word");
    let service = GameService::new(Arc::new(FailingOutcomeStore::default()), Arc::new(words));
    let id = start(&service, "Mila").await;

    service.guess(id, "Д").await.expect("Guess failed");
    let err = service.guess(id, "А").await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));

    // Nothing from the failed guess was kept.
    assert_eq!(service.steps(id).await.expect("Steps failed").len(), 1);
    let view = service.game(id).await.expect("Game failed");
    assert_eq!(*view.game().outcome(), Outcome::Playing);
    assert_eq!(*view.display().outcome(), Outcome::Playing);

    // The same guess succeeds once the store recovers.
    let report = service.guess(id, "А").await.expect("Retry failed");
    assert_eq!(*report.outcome(), Outcome::Won);
    let view = service.game(id).await.expect("Game failed");
    assert_eq!(*view.game().outcome(), Outcome::Won);
    assert_eq!(service.steps(id).await.expect("Steps failed").len(), 2);
}
