//! Hangman: word source, session state machine and display projection.

mod action;
mod display;
mod session;
mod types;
mod words;

pub use action::{GameError, GuessOutcome, Move};
pub use display::{Cell, DisplayState, Key, KeyStatus};
pub use session::Session;
pub use types::{
    ALPHABET, GuessResult, MAX_MISTAKES, Outcome, SessionId, normalize_letter, normalize_word,
    parse_letter,
};
pub use words::{DEFAULT_WORDS, FixedWord, Vocabulary, WordSource};
