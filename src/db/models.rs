//! Database rows and their conversion to domain types.

use std::str::FromStr;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::games::hangman::{GuessResult, Move, Outcome, SessionId};
use crate::store::GameRecord;

/// Game summary row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameRow {
    id: i32,
    played_at: NaiveDateTime,
    player_name: String,
    word: String,
    outcome: String,
}

impl GameRow {
    /// Converts the row into a [`GameRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored outcome is not a known value.
    #[instrument(skip(self), fields(id = self.id))]
    pub fn into_record(self) -> Result<GameRecord, DbError> {
        let outcome = parse_outcome(&self.outcome)?;
        Ok(GameRecord::new(
            SessionId::new(self.id),
            self.played_at,
            self.player_name,
            self.word,
            outcome,
        ))
    }
}

/// Insertable game row. `played_at` comes from the column default.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGameRow {
    player_name: String,
    word: String,
    outcome: String,
}

/// Move history row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::steps)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StepRow {
    id: i32,
    game_id: i32,
    step_number: i32,
    letter: String,
    result: String,
    outcome_after: String,
}

impl StepRow {
    /// Converts the row into a [`Move`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] for a negative step number, a letter that is not
    /// exactly one character, or an unknown result/outcome value.
    #[instrument(skip(self), fields(id = self.id, game_id = self.game_id))]
    pub fn into_move(self) -> Result<Move, DbError> {
        let step_number = u32::try_from(self.step_number)
            .map_err(|_| DbError::corrupt(format!("Invalid step number: {}", self.step_number)))?;

        let mut chars = self.letter.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(DbError::corrupt(format!("Invalid letter: '{}'", self.letter))),
        };

        let result = GuessResult::from_str(&self.result)
            .map_err(|_| DbError::corrupt(format!("Invalid result: '{}'", self.result)))?;
        let outcome_after = parse_outcome(&self.outcome_after)?;

        Ok(Move::new(step_number, letter, result, outcome_after))
    }
}

/// Insertable move row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::steps)]
pub struct NewStepRow {
    game_id: i32,
    step_number: i32,
    letter: String,
    result: String,
    outcome_after: String,
}

impl NewStepRow {
    /// Builds the row for a move of the given game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the step number does not fit the column.
    pub fn from_move(game_id: i32, mv: &Move) -> Result<Self, DbError> {
        let step_number = i32::try_from(mv.step_number)
            .map_err(|_| DbError::corrupt(format!("Step number too large: {}", mv.step_number)))?;
        Ok(Self::new(
            game_id,
            step_number,
            mv.letter.to_string(),
            mv.result.to_string(),
            mv.outcome_after.to_string(),
        ))
    }
}

fn parse_outcome(s: &str) -> Result<Outcome, DbError> {
    Outcome::from_str(s).map_err(|_| DbError::corrupt(format!("Invalid outcome: '{}'", s)))
}
