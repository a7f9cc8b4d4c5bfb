//! Moves and guess errors.
//!
//! A move is one evaluated letter guess. Moves are what the move log stores
//! and what replay feeds back through the session rules.

use derive_new::new;
use serde::{Deserialize, Serialize};

use super::{GuessResult, Outcome};

/// One evaluated guess within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// 1-based position of this move in its session.
    pub step_number: u32,
    /// The guessed letter, uppercase.
    pub letter: char,
    /// Hit or miss at the time of the guess.
    pub result: GuessResult,
    /// Session outcome right after this move. Kept for history display;
    /// replay recomputes it instead of trusting it.
    pub outcome_after: Outcome,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({})", self.step_number, self.letter, self.result)
    }
}

/// Result of a successful guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessOutcome {
    /// Whether the letter was in the word.
    pub result: GuessResult,
    /// Session outcome after the guess.
    pub outcome: Outcome,
}

/// Error that can occur when creating a session or applying a guess.
///
/// A failed guess never changes the session.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// Empty target word or malformed guess.
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),

    /// The session already ended.
    #[display("Session is over ({})", _0)]
    SessionTerminated(Outcome),

    /// The letter was guessed earlier in this session.
    #[display("Letter '{}' was already guessed", _0)]
    DuplicateGuess(char),
}

impl std::error::Error for GameError {}
