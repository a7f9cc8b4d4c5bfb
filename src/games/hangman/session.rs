//! Hangman session state machine.
//!
//! A session moves from `Playing` to `Won` or `Lost` and never back. Every
//! transition goes through [`Session::guess`], which is also what replay
//! uses, so live play and replay cannot disagree.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use super::display::{Cell, DisplayState, Key, KeyStatus};
use super::{
    ALPHABET, GameError, GuessOutcome, GuessResult, MAX_MISTAKES, Move, Outcome, normalize_letter,
    normalize_word,
};

/// State of one hangman game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    target: Vec<char>,
    guessed: BTreeSet<char>,
    mistakes: u8,
    outcome: Outcome,
}

impl Session {
    /// Starts a session for the given word. The word is upper-cased.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidInput`] if the word is empty or holds a
    /// character that cannot be guessed.
    #[instrument(skip(target_word), fields(len = target_word.chars().count()))]
    pub fn create(target_word: &str) -> Result<Self, GameError> {
        let word = normalize_word(target_word).inspect_err(|e| {
            warn!(error = %e, "Rejected target word");
        })?;

        debug!("Session created");
        Ok(Self {
            target: word.chars().collect(),
            guessed: BTreeSet::new(),
            mistakes: 0,
            outcome: Outcome::Playing,
        })
    }

    /// Rebuilds a session by replaying stored moves through [`Session::guess`].
    ///
    /// Stored results and outcomes are ignored; only the letters matter.
    ///
    /// # Errors
    ///
    /// Returns the first [`GameError`] a move triggers, e.g. a duplicate
    /// letter or a move after the session ended.
    #[instrument(skip(target_word, moves), fields(moves = moves.len()))]
    pub fn restore(target_word: &str, moves: &[Move]) -> Result<Self, GameError> {
        let mut session = Self::create(target_word)?;
        for mv in moves {
            let applied = session.guess(mv.letter)?;
            if applied.result != mv.result || applied.outcome != mv.outcome_after {
                warn!(
                    step = mv.step_number,
                    stored_result = %mv.result,
                    stored_outcome = %mv.outcome_after,
                    result = %applied.result,
                    outcome = %applied.outcome,
                    "Stored move disagrees with recomputed result"
                );
            }
        }
        Ok(session)
    }

    /// Applies a letter guess.
    ///
    /// LOST is settled before WON. On error the session is unchanged.
    ///
    /// # Errors
    ///
    /// - [`GameError::SessionTerminated`] if the session already ended.
    /// - [`GameError::InvalidInput`] if `letter` is not a letter.
    /// - [`GameError::DuplicateGuess`] if the letter was guessed before.
    #[instrument(skip(self), fields(outcome = %self.outcome, mistakes = self.mistakes))]
    pub fn guess(&mut self, letter: char) -> Result<GuessOutcome, GameError> {
        if self.outcome.is_terminal() {
            warn!("Guess after session ended");
            return Err(GameError::SessionTerminated(self.outcome));
        }

        let letter = normalize_letter(letter)?;
        if self.guessed.contains(&letter) {
            warn!(%letter, "Duplicate guess");
            return Err(GameError::DuplicateGuess(letter));
        }

        self.guessed.insert(letter);
        let result = if self.target.contains(&letter) {
            GuessResult::Hit
        } else {
            self.mistakes += 1;
            GuessResult::Miss
        };

        self.outcome = if self.mistakes >= MAX_MISTAKES {
            Outcome::Lost
        } else if self.target.iter().all(|c| self.guessed.contains(c)) {
            Outcome::Won
        } else {
            Outcome::Playing
        };

        if self.outcome.is_terminal() {
            info!(%letter, %result, outcome = %self.outcome, "Session finished");
        } else {
            debug!(%letter, %result, mistakes = self.mistakes, "Guess applied");
        }

        Ok(GuessOutcome {
            result,
            outcome: self.outcome,
        })
    }

    /// Produces the display snapshot.
    ///
    /// With `reveal_on_loss`, unguessed letters of a lost session are shown
    /// as [`Cell::Missed`].
    #[instrument(skip(self))]
    pub fn render(&self, reveal_on_loss: bool) -> DisplayState {
        let reveal = reveal_on_loss && self.outcome == Outcome::Lost;

        let cells = self
            .target
            .iter()
            .map(|&c| {
                if self.guessed.contains(&c) {
                    Cell::Revealed(c)
                } else if reveal {
                    Cell::Missed(c)
                } else {
                    Cell::Blank
                }
            })
            .collect();

        let keyboard = ALPHABET
            .chars()
            .map(|letter| {
                let status = if !self.guessed.contains(&letter) {
                    KeyStatus::Unused
                } else if self.target.contains(&letter) {
                    KeyStatus::Hit
                } else {
                    KeyStatus::Miss
                };
                Key::new(letter, status)
            })
            .collect();

        DisplayState::new(cells, keyboard, self.mistakes, MAX_MISTAKES, self.outcome)
    }

    /// Returns the target word.
    pub fn target_word(&self) -> String {
        self.target.iter().collect()
    }

    /// Returns the guessed letters.
    pub fn guessed(&self) -> &BTreeSet<char> {
        &self.guessed
    }

    /// Returns the number of misses.
    pub fn mistakes(&self) -> u8 {
        self.mistakes
    }

    /// Returns the current outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}
