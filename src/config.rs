//! Server configuration.
//!
//! Values come from an optional TOML file, then `DATABASE_URL` from the
//! environment (or `.env`), then command-line overrides.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::games::hangman::Vocabulary;

/// Environment variable that overrides the database path.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Configuration for the hangman server and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database file.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Delay between replay frames, in milliseconds.
    #[serde(default = "default_replay_delay_ms")]
    replay_delay_ms: u64,

    /// Show the missing letters of a lost game.
    #[serde(default = "default_reveal_on_loss")]
    reveal_on_loss: bool,

    /// Replacement word list. The built-in dictionary is used when absent.
    #[serde(default)]
    vocabulary: Option<Vec<String>>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "hangman.db".to_string()
}

fn default_replay_delay_ms() -> u64 {
    800
}

fn default_reveal_on_loss() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            replay_delay_ms: default_replay_delay_ms(),
            reveal_on_loss: default_reveal_on_loss(),
            vocabulary: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(port = config.port, db = %config.database_path, "Config loaded");
        Ok(config)
    }

    /// Loads the file if given and present, otherwise defaults, then applies
    /// `DATABASE_URL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be read or parsed.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            Some(p) => {
                info!("Config file not found at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV)
            && !url.trim().is_empty()
        {
            debug!(db = %url, "Database path from environment");
            config.database_path = url;
        }
        Ok(config)
    }

    /// Applies command-line overrides.
    #[instrument(skip(self))]
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        database_path: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }

    /// Delay between replay frames.
    pub fn replay_delay(&self) -> Duration {
        Duration::from_millis(self.replay_delay_ms)
    }

    /// Builds the word list for new games.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a configured list is empty or holds an
    /// empty word.
    #[instrument(skip(self))]
    pub fn build_vocabulary(&self) -> Result<Vocabulary, ConfigError> {
        match &self.vocabulary {
            Some(words) => Vocabulary::new(words)
                .map_err(|e| ConfigError::new(format!("Invalid vocabulary: {}", e))),
            None => Ok(Vocabulary::default()),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
