//! Replay of stored games.
//!
//! Frames are recomputed by feeding the logged letters into a fresh
//! [`Session`]; the outcome stored with each move is never read. Paced
//! playback waits between frames and stops as soon as its cancellation
//! token fires.

use std::time::Duration;

use derive_getters::Getters;
use derive_new::new;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::games::hangman::{DisplayState, GameError, GuessResult, Move, Session};

/// Inter-frame delay used by the reference client.
pub const DEFAULT_REPLAY_DELAY: Duration = Duration::from_millis(800);

/// Display state after one replayed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFrame {
    step_number: u32,
    letter: char,
    result: GuessResult,
    state: DisplayState,
}

/// How a paced playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Every frame was shown.
    Completed {
        /// Frames shown.
        frames: usize,
    },
    /// The cancellation token fired first.
    Cancelled {
        /// Frames shown before cancellation.
        frames: usize,
    },
}

/// Replays one stored game.
#[derive(Debug, Clone, Getters)]
pub struct ReplayPlayer {
    word: String,
    moves: Vec<Move>,
    reveal_on_loss: bool,
}

impl ReplayPlayer {
    /// Creates a player for a word and its move log. Moves are sorted by
    /// step number.
    #[instrument(skip(word, moves), fields(moves = moves.len()))]
    pub fn new(word: impl Into<String>, mut moves: Vec<Move>) -> Self {
        moves.sort_by_key(|m| m.step_number);
        Self {
            word: word.into(),
            moves,
            reveal_on_loss: false,
        }
    }

    /// Sets whether frames of a lost game reveal the missing letters.
    pub fn with_reveal_on_loss(mut self, reveal: bool) -> Self {
        self.reveal_on_loss = reveal;
        self
    }

    /// Display state before the first move.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidInput`] if the stored word is empty.
    pub fn initial_state(&self) -> Result<DisplayState, GameError> {
        Ok(Session::create(&self.word)?.render(self.reveal_on_loss))
    }

    /// Returns a fresh lazy sequence of frames. Each call starts over.
    pub fn frames(&self) -> Replay<'_> {
        Replay {
            session: Session::create(&self.word),
            moves: self.moves.iter(),
            reveal_on_loss: self.reveal_on_loss,
            done: false,
        }
    }

    /// Collects every frame.
    ///
    /// # Errors
    ///
    /// Returns the first error the rules raise while replaying.
    #[instrument(skip(self), fields(moves = self.moves.len()))]
    pub fn collect_frames(&self) -> Result<Vec<ReplayFrame>, GameError> {
        self.frames().collect()
    }

    /// Shows frames one by one, waiting `delay` before each.
    ///
    /// Returns as soon as `cancel` fires; the pending sleep is dropped with
    /// it, so nothing stays scheduled.
    ///
    /// # Errors
    ///
    /// Returns the first error the rules raise while replaying.
    #[instrument(skip(self, cancel, on_frame), fields(moves = self.moves.len(), delay_ms = delay.as_millis() as u64))]
    pub async fn play<F>(
        &self,
        delay: Duration,
        cancel: &CancellationToken,
        mut on_frame: F,
    ) -> Result<Playback, GameError>
    where
        F: FnMut(&ReplayFrame),
    {
        let mut shown = 0;
        for frame in self.frames() {
            let frame = frame?;

            if cancel.is_cancelled() {
                info!(shown, "Replay cancelled");
                return Ok(Playback::Cancelled { frames: shown });
            }
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        info!(shown, "Replay cancelled");
                        return Ok(Playback::Cancelled { frames: shown });
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }

            on_frame(&frame);
            shown += 1;
            debug!(step = frame.step_number, "Frame shown");
        }

        info!(shown, "Replay completed");
        Ok(Playback::Completed { frames: shown })
    }
}

/// Lazy sequence of replay frames. Stops after the first error.
#[derive(Debug)]
pub struct Replay<'a> {
    session: Result<Session, GameError>,
    moves: std::slice::Iter<'a, Move>,
    reveal_on_loss: bool,
    done: bool,
}

impl Iterator for Replay<'_> {
    type Item = Result<ReplayFrame, GameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mv = self.moves.next()?;

        let session = match &mut self.session {
            Ok(session) => session,
            Err(e) => {
                self.done = true;
                return Some(Err(e.clone()));
            }
        };

        match session.guess(mv.letter) {
            Ok(applied) => Some(Ok(ReplayFrame::new(
                mv.step_number,
                mv.letter,
                applied.result,
                session.render(self.reveal_on_loss),
            ))),
            Err(e) => {
                warn!(step = mv.step_number, error = %e, "Replay stopped on rejected move");
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
