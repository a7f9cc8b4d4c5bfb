//! SQLite persistence for games and their move history.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::{DbError, DbErrorKind};
pub use models::{GameRow, NewGameRow, NewStepRow, StepRow};
pub use repository::{GameRepository, MIGRATIONS};
