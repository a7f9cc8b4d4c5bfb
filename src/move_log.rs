//! Append-only, per-session move history.

use std::collections::HashMap;

use derive_more::Display;
use tracing::{debug, instrument, warn};

use crate::games::hangman::{Move, SessionId};

/// A move was appended with a step number that does not directly follow the
/// last recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(
    "Out-of-order step for session {}: expected {}, got {}",
    session_id,
    expected,
    found
)]
pub struct OutOfOrder {
    /// Session the move was meant for.
    pub session_id: SessionId,
    /// Step number the log would accept.
    pub expected: u32,
    /// Step number that was submitted.
    pub found: u32,
}

impl std::error::Error for OutOfOrder {}

/// Returns the step number that follows `last` (1 for an empty log).
pub fn next_step(last: Option<u32>) -> u32 {
    last.map_or(1, |n| n + 1)
}

/// Checks that `step` directly follows `last`.
///
/// # Errors
///
/// Returns [`OutOfOrder`] otherwise.
#[instrument]
pub fn check_step(session_id: SessionId, last: Option<u32>, step: u32) -> Result<(), OutOfOrder> {
    let expected = next_step(last);
    if step == expected {
        Ok(())
    } else {
        warn!(expected, found = step, "Rejected out-of-order step");
        Err(OutOfOrder {
            session_id,
            expected,
            found: step,
        })
    }
}

/// Ordered moves for any number of sessions. Entries are never changed or
/// removed once appended.
#[derive(Debug, Clone, Default)]
pub struct MoveLog {
    entries: HashMap<SessionId, Vec<Move>>,
}

impl MoveLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a move to a session's history.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfOrder`] unless `mv.step_number` is the last step plus
    /// one, or 1 for a session with no moves.
    #[instrument(skip(self), fields(step = mv.step_number, letter = %mv.letter))]
    pub fn append(&mut self, session_id: SessionId, mv: Move) -> Result<(), OutOfOrder> {
        let moves = self.entries.entry(session_id).or_default();
        check_step(session_id, moves.last().map(|m| m.step_number), mv.step_number)?;
        moves.push(mv);
        debug!(len = moves.len(), "Move appended");
        Ok(())
    }

    /// Returns a session's moves in step order.
    pub fn list(&self, session_id: SessionId) -> Vec<Move> {
        self.entries.get(&session_id).cloned().unwrap_or_default()
    }

    /// Returns the last recorded step number of a session.
    pub fn last_step(&self, session_id: SessionId) -> Option<u32> {
        self.entries
            .get(&session_id)
            .and_then(|moves| moves.last())
            .map(|m| m.step_number)
    }
}
