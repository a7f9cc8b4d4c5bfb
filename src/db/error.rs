//! Store failure types.

use derive_more::{Display, Error};
use tracing::instrument;

/// What part of the storage stack failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DbErrorKind {
    /// Bad repository settings, such as an empty path.
    Config,
    /// The database file could not be opened.
    Connection,
    /// Schema migrations failed.
    Migration,
    /// A statement failed.
    Query,
    /// A stored row does not decode into a game or move.
    Corrupt,
    /// The store could not be reached from the caller.
    Internal,
    /// A lock guarding store state was poisoned by a panic. Permanent.
    Poisoned,
}

/// Storage error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Database {} error: {} at {}:{}", kind, message, file, line)]
pub struct DbError {
    /// Failure category.
    pub kind: DbErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates a storage error tagged with the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for a row that fails to decode.
    #[track_caller]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(DbErrorKind::Corrupt, message)
    }

    /// True when retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, DbErrorKind::Connection | DbErrorKind::Internal)
            || self.message.contains("database is locked")
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DbErrorKind::Connection, err.to_string())
    }
}
