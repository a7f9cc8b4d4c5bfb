//! Word source: random target words from a fixed vocabulary.

use derive_getters::Getters;
use rand::Rng;
use tracing::{debug, instrument};

use super::{GameError, normalize_word};

/// Built-in dictionary.
pub const DEFAULT_WORDS: [&str; 8] = [
    "СЕРВЕР", "КЛИЕНТ", "СКРИПТ", "ПРОЕКТ", "ДОМЕНЫ", "ПАРОЛЬ", "БАЙТЫ", "ФАЙЛЫ",
];

/// Supplies target words for new sessions.
pub trait WordSource: std::fmt::Debug + Send + Sync {
    /// Returns a target word. Never empty.
    fn pick_word(&self) -> String;
}

/// Non-empty list of uppercase words. Duplicates are allowed and weight the
/// draw.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary, upper-casing every word.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidInput`] if the list is empty or holds a
    /// word that is empty or contains a character other than a letter.
    #[instrument(skip(words))]
    pub fn new<I, S>(words: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| normalize_word(w.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if words.is_empty() {
            return Err(GameError::InvalidInput("vocabulary is empty".to_string()));
        }

        debug!(count = words.len(), "Vocabulary built");
        Ok(Self { words })
    }

    /// Draws a word uniformly using the given generator.
    pub fn pick_with<R: Rng>(&self, rng: &mut R) -> &str {
        &self.words[rng.random_range(0..self.words.len())]
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl WordSource for Vocabulary {
    #[instrument(skip(self), fields(count = self.words.len()))]
    fn pick_word(&self) -> String {
        self.pick_with(&mut rand::rng()).to_string()
    }
}

/// Word source that always returns the same word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedWord(String);

impl FixedWord {
    /// Creates a fixed source.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidInput`] if the word is empty or contains
    /// a character other than a letter.
    pub fn new(word: impl AsRef<str>) -> Result<Self, GameError> {
        Ok(Self(normalize_word(word.as_ref())?))
    }
}

impl WordSource for FixedWord {
    fn pick_word(&self) -> String {
        self.0.clone()
    }
}
