//! Core domain types for hangman.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::GameError;

/// Number of misses that ends a session.
pub const MAX_MISTAKES: u8 = 6;

/// Letters shown on the on-screen keyboard, in display order.
///
/// The keyboard is a UI affordance only: `Session::guess` accepts any
/// alphabetic character.
pub const ALPHABET: &str = "АБВГДЕЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯ";

/// Opaque identifier of a stored game session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct SessionId(i32);

impl SessionId {
    /// Wraps a raw store identifier.
    pub fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw store identifier.
    pub fn get(self) -> i32 {
        self.0
    }
}

/// Classification of a session: still playing, or finished.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Outcome {
    /// Guesses are still accepted.
    #[default]
    Playing,
    /// Every letter of the word was guessed.
    Won,
    /// The mistake limit was reached.
    Lost,
}

impl Outcome {
    /// Returns true for `Won` and `Lost`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Whether a guessed letter occurs in the target word.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GuessResult {
    /// The letter is in the word.
    Hit,
    /// The letter is not in the word.
    Miss,
}

/// Normalizes a single guessed character to its uppercase form.
///
/// # Errors
///
/// Returns [`GameError::InvalidInput`] for non-alphabetic characters and for
/// characters whose uppercase form is more than one character.
#[instrument]
pub fn normalize_letter(letter: char) -> Result<char, GameError> {
    if !letter.is_alphabetic() {
        return Err(GameError::InvalidInput(format!(
            "'{}' is not a letter",
            letter.escape_default()
        )));
    }

    let mut upper = letter.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(GameError::InvalidInput(format!(
            "'{}' has no single-letter uppercase form",
            letter
        ))),
    }
}

/// Normalizes a target word: trimmed, every character a guessable letter,
/// upper-cased.
///
/// # Errors
///
/// Returns [`GameError::InvalidInput`] if the word is empty or holds a
/// character that [`normalize_letter`] rejects, since such a word could never
/// be completed.
#[instrument(skip(word), fields(len = word.chars().count()))]
pub fn normalize_word(word: &str) -> Result<String, GameError> {
    let word = word.trim();
    if word.is_empty() {
        return Err(GameError::InvalidInput("target word is empty".to_string()));
    }
    word.chars()
        .map(normalize_letter)
        .collect::<Result<String, _>>()
        .map_err(|e| GameError::InvalidInput(format!("word '{}' is not guessable: {}", word, e)))
}

/// Parses a guess submitted as text: exactly one letter, surrounding
/// whitespace ignored.
///
/// # Errors
///
/// Returns [`GameError::InvalidInput`] when the input is empty, holds more
/// than one character, or is not a letter.
#[instrument(skip(input), fields(input = %input))]
pub fn parse_letter(input: &str) -> Result<char, GameError> {
    let mut chars = input.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => normalize_letter(c),
        (None, _) => Err(GameError::InvalidInput("empty guess".to_string())),
        _ => Err(GameError::InvalidInput(format!(
            "'{}' is not a single letter",
            input.trim()
        ))),
    }
}
