//! Declarative snapshot of a session for presentation layers.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

use super::Outcome;

/// One position of the target word as the player sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "letter", rename_all = "camelCase")]
pub enum Cell {
    /// Not guessed yet.
    Blank,
    /// Guessed by the player.
    Revealed(char),
    /// Never guessed, shown because the session was lost.
    Missed(char),
}

/// State of a keyboard letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyStatus {
    /// Not guessed.
    Unused,
    /// Guessed and present in the word.
    Hit,
    /// Guessed and absent from the word.
    Miss,
}

/// One key of the on-screen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Key {
    /// The letter on the key.
    pub letter: char,
    /// Whether and how it was guessed.
    pub status: KeyStatus,
}

/// Renderable projection of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    /// One cell per character of the target word.
    cells: Vec<Cell>,
    /// Keyboard letters in alphabet order.
    keyboard: Vec<Key>,
    /// Misses so far.
    mistakes: u8,
    /// Misses that end the session.
    max_mistakes: u8,
    /// Session outcome.
    outcome: Outcome,
}

impl DisplayState {
    /// Returns true when every cell shows a guessed letter.
    pub fn is_word_revealed(&self) -> bool {
        self.cells.iter().all(|c| matches!(c, Cell::Revealed(_)))
    }

    /// Returns the word as shown, with `_` for blanks.
    pub fn masked_word(&self) -> String {
        self.cells
            .iter()
            .map(|cell| match cell {
                Cell::Blank => '_',
                Cell::Revealed(c) | Cell::Missed(c) => *c,
            })
            .collect()
    }

    /// Returns whether the keyboard still accepts input.
    pub fn accepts_input(&self) -> bool {
        !self.outcome.is_terminal()
    }
}
