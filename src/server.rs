//! HTTP API.
//!
//! | Method | Path                  | Action                         |
//! |--------|-----------------------|--------------------------------|
//! | GET    | `/health`             | liveness                       |
//! | POST   | `/games`              | start a game                   |
//! | GET    | `/games`              | list games, most recent first  |
//! | GET    | `/games/{id}`         | game summary and display state |
//! | POST   | `/games/{id}/guess`   | guess a letter                 |
//! | GET    | `/games/{id}/steps`   | move log                       |
//! | GET    | `/games/{id}/replay`  | replay frames                  |

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::games::hangman::{DisplayState, GameError, Move, Outcome, SessionId};
use crate::replay::ReplayFrame;
use crate::service::{GameService, GameView, GuessReport, ServiceError};
use crate::store::{GameRecord, StoreError};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Game operations.
    pub service: GameService,
    /// Delay clients should use between replay frames.
    pub replay_delay_ms: u64,
}

/// Request body for starting a game. The body itself may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGameRequest {
    /// Player name; defaults to "Unknown".
    #[serde(default)]
    pub player_name: Option<String>,
}

/// Request body for a guess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessRequest {
    /// The guessed letter.
    pub letter: String,
}

/// Game summary in listings. The word is hidden while the game is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    /// Game id.
    pub id: SessionId,
    /// Creation time (UTC).
    pub date: NaiveDateTime,
    /// Player name.
    pub player_name: String,
    /// Target word, once the game is over.
    pub word: Option<String>,
    /// Current outcome.
    pub outcome: Outcome,
}

impl From<&GameRecord> for GameSummary {
    fn from(game: &GameRecord) -> Self {
        Self {
            id: *game.id(),
            date: *game.date(),
            player_name: game.player_name().clone(),
            word: game.outcome().is_terminal().then(|| game.word().clone()),
            outcome: *game.outcome(),
        }
    }
}

/// A game and its display state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    /// Summary.
    pub game: GameSummary,
    /// Current display state.
    pub display: DisplayState,
}

impl From<GameView> for GameResponse {
    fn from(view: GameView) -> Self {
        Self {
            game: GameSummary::from(view.game()),
            display: view.display().clone(),
        }
    }
}

/// Replay data for clients that pace playback themselves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResponse {
    /// Game id.
    pub id: SessionId,
    /// State before the first move.
    pub initial: DisplayState,
    /// One frame per move.
    pub frames: Vec<ReplayFrame>,
    /// Suggested delay between frames.
    pub delay_ms: u64,
}

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
}

/// Creates the HTTP router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/games", get(list_games).post(new_game))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/guess", post(guess))
        .route("/games/{id}/steps", get(list_steps))
        .route("/games/{id}/replay", get(replay))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
#[instrument(skip(service, config), fields(host = %config.host(), port = config.port()))]
pub async fn serve(service: GameService, config: &ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        service,
        replay_delay_ms: *config.replay_delay_ms(),
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[instrument(skip(state, req))]
async fn new_game(
    State(state): State<Arc<AppState>>,
    req: Option<Json<NewGameRequest>>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let player_name = req.and_then(|Json(req)| req.player_name);
    let view = state.service.new_game(player_name).await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

#[instrument(skip(state))]
async fn list_games(State(state): State<Arc<AppState>>) -> Result<Json<Vec<GameSummary>>, AppError> {
    let games = state.service.list_games().await?;
    Ok(Json(games.iter().map(GameSummary::from).collect()))
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<GameResponse>, AppError> {
    let view = state.service.game(SessionId::new(id)).await?;
    Ok(Json(view.into()))
}

#[instrument(skip(state, req), fields(letter = %req.letter))]
async fn guess(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<GuessRequest>,
) -> Result<Json<GuessReport>, AppError> {
    let report = state.service.guess(SessionId::new(id), &req.letter).await?;
    Ok(Json(report))
}

#[instrument(skip(state))]
async fn list_steps(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Move>>, AppError> {
    Ok(Json(state.service.steps(SessionId::new(id)).await?))
}

#[instrument(skip(state))]
async fn replay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ReplayResponse>, AppError> {
    let id = SessionId::new(id);
    let player = state.service.replay(id).await?;
    let initial = player.initial_state()?;
    let frames = player.collect_frames()?;
    Ok(Json(ReplayResponse {
        id,
        initial,
        frames,
        delay_ms: state.replay_delay_ms,
    }))
}

/// Application error type.
#[derive(Debug)]
pub struct AppError(ServiceError);

impl AppError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Game(GameError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ServiceError::Game(GameError::SessionTerminated(_) | GameError::DuplicateGuess(_)) => {
                StatusCode::CONFLICT
            }
            ServiceError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Store(StoreError::OutOfOrder(_)) => StatusCode::CONFLICT,
            ServiceError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, %status, "Request failed");
        } else {
            warn!(error = %self.0, %status, "Request rejected");
        }
        let body = Json(serde_json::json!({
            "error": self.0.to_string()
        }));
        match &self.0 {
            ServiceError::Store(StoreError::Unavailable(e)) if e.is_transient() => {
                (status, [(header::RETRY_AFTER, "1")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<ServiceError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
