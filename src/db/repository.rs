//! Database repository for games and move history.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, DbErrorKind, GameRow, NewGameRow, NewStepRow, StepRow, schema};
use crate::games::hangman::{Move, Outcome, SessionId};
use crate::move_log::check_step;
use crate::store::{GameRecord, StoreError};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite-backed repository. Every call opens its own connection, so the
/// repository is cheap to clone and share between threads.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a repository for the database file at the given path.
    ///
    /// The schema is not touched; see [`GameRepository::open`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new(DbErrorKind::Config, "Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Creates a repository and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, DbError> {
        let repo = Self::new(db_path)?;
        repo.run_migrations()?;
        Ok(repo)
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration, format!("Migrations failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            DbError::new(
                DbErrorKind::Connection,
                format!("Failed to connect to '{}': {}", self.db_path, e),
            )
        })?;
        diesel::sql_query("PRAGMA busy_timeout = 5000").execute(&mut conn)?;
        diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut conn)?;
        Ok(conn)
    }

    /// Inserts a new game in the `PLAYING` state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, word))]
    pub fn create_game(&self, player_name: &str, word: &str) -> Result<GameRecord, DbError> {
        debug!("Creating game");
        let mut conn = self.connection()?;

        let row = NewGameRow::new(
            player_name.to_string(),
            word.to_string(),
            Outcome::Playing.to_string(),
        );

        let game = diesel::insert_into(schema::games::table)
            .values(&row)
            .returning(GameRow::as_returning())
            .get_result(&mut conn)?;

        info!(game_id = game.id(), "Game created");
        game.into_record()
    }

    /// Gets a game by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_game(&self, id: SessionId) -> Result<Option<GameRecord>, DbError> {
        let mut conn = self.connection()?;

        let game = schema::games::table
            .find(id.get())
            .select(GameRow::as_select())
            .first(&mut conn)
            .optional()?;

        match game {
            Some(row) => Ok(Some(row.into_record()?)),
            None => {
                debug!("Game not found");
                Ok(None)
            }
        }
    }

    /// Lists all games, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_games(&self) -> Result<Vec<GameRecord>, DbError> {
        let mut conn = self.connection()?;

        let rows = schema::games::table
            .order(schema::games::id.desc())
            .select(GameRow::as_select())
            .load(&mut conn)?;

        info!(count = rows.len(), "Games loaded");
        rows.into_iter().map(GameRow::into_record).collect()
    }

    /// Appends a move inside an immediate transaction, so concurrent writers
    /// for the same game are serialized by SQLite.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the game does not exist.
    /// - [`StoreError::OutOfOrder`] if the step does not follow the last one.
    /// - [`StoreError::Unavailable`] on database failure.
    #[instrument(skip(self, mv), fields(step = mv.step_number, letter = %mv.letter))]
    pub fn append_step(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        let row = NewStepRow::from_move(id.get(), mv)?;
        let mut conn = self.connection()?;

        conn.immediate_transaction::<_, StoreError, _>(|conn| insert_step(conn, id, mv, &row))?;

        debug!("Step recorded");
        Ok(())
    }

    /// Appends a move and, when it ends the game, stores the final outcome.
    ///
    /// Both writes share one immediate transaction: either the move and the
    /// outcome are stored together or neither is.
    ///
    /// # Errors
    ///
    /// Same as [`GameRepository::append_step`].
    #[instrument(skip(self, mv), fields(step = mv.step_number, letter = %mv.letter, outcome = %mv.outcome_after))]
    pub fn record_move(&self, id: SessionId, mv: &Move) -> Result<(), StoreError> {
        let row = NewStepRow::from_move(id.get(), mv)?;
        let mut conn = self.connection()?;

        conn.immediate_transaction::<_, StoreError, _>(|conn| {
            insert_step(conn, id, mv, &row)?;
            if mv.outcome_after.is_terminal() {
                set_outcome(conn, id, mv.outcome_after)?;
            }
            Ok(())
        })?;

        if mv.outcome_after.is_terminal() {
            info!("Final move recorded");
        } else {
            debug!("Step recorded");
        }
        Ok(())
    }

    /// Sets the outcome of a game.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the game does not exist.
    /// - [`StoreError::Unavailable`] on database failure.
    #[instrument(skip(self))]
    pub fn update_outcome(&self, id: SessionId, outcome: Outcome) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        set_outcome(&mut conn, id, outcome)?;
        info!(%outcome, "Outcome updated");
        Ok(())
    }

    /// Lists the moves of a game in step order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row is corrupt.
    #[instrument(skip(self))]
    pub fn list_steps(&self, id: SessionId) -> Result<Vec<Move>, DbError> {
        let mut conn = self.connection()?;

        let rows = schema::steps::table
            .filter(schema::steps::game_id.eq(id.get()))
            .order(schema::steps::step_number.asc())
            .select(StepRow::as_select())
            .load(&mut conn)?;

        debug!(count = rows.len(), "Steps loaded");
        rows.into_iter().map(StepRow::into_move).collect()
    }
}

/// Checks ordering and inserts one step. Runs inside the caller's transaction.
fn insert_step(
    conn: &mut SqliteConnection,
    id: SessionId,
    mv: &Move,
    row: &NewStepRow,
) -> Result<(), StoreError> {
    let exists = schema::games::table
        .find(id.get())
        .select(schema::games::id)
        .first::<i32>(conn)
        .optional()?;
    if exists.is_none() {
        warn!("Step for unknown game");
        return Err(StoreError::NotFound(id));
    }

    let last = schema::steps::table
        .filter(schema::steps::game_id.eq(id.get()))
        .select(diesel::dsl::max(schema::steps::step_number))
        .get_result::<Option<i32>>(conn)?;
    let last = last
        .map(u32::try_from)
        .transpose()
        .map_err(|_| DbError::corrupt("Negative step number in history"))?;
    check_step(id, last, mv.step_number)?;

    diesel::insert_into(schema::steps::table)
        .values(row)
        .execute(conn)?;
    Ok(())
}

fn set_outcome(
    conn: &mut SqliteConnection,
    id: SessionId,
    outcome: Outcome,
) -> Result<(), StoreError> {
    let updated = diesel::update(schema::games::table.find(id.get()))
        .set(schema::games::outcome.eq(outcome.to_string()))
        .execute(conn)?;

    if updated == 0 {
        warn!("Outcome update for unknown game");
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}
