// src/lib.rs
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// --- Declare modules ---
pub mod autocomplete;
pub mod catalog;
mod config;
pub mod db;
pub mod draft;
pub mod settings;

// --- Expose public types ---
pub use autocomplete::ExerciseDropdown;
pub use catalog::{CatalogEntry, ExerciseCatalog};
pub use config::{
    get_config_path as get_config_path_util,
    load_config as load_config_util,
    parse_color,
    save_config as save_config_util,
    Config,
    Error as ConfigError,
    SortOrder,
    StandardColor,
    Theme,
};
pub use db::{
    get_db_path as get_db_path_util, Error as DbError, ExerciseSet, Note, SetOrder, SettingKey,
    Workout,
};
pub use draft::{
    clear_draft, load_draft, save_draft, DraftRow, RowField, WorkoutDraft, DRAFT_FILE_NAME,
};
pub use settings::Settings;

const CATALOG_FILE_NAME: &str = "exercises.json";

/// Draft validation failures, one distinct user-facing message per kind.
/// Checks run in this order and fail fast; nothing is written on failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Fill in all fields before saving")]
    MissingFields,
    #[error("Negative values are not allowed")]
    NegativeValue,
    #[error("Enter valid numbers")]
    InvalidNumber,
}

/// A draft row with its numeric fields parsed, ready to persist.
#[derive(Debug, Clone, PartialEq)]
struct ValidatedRow {
    id: Option<i64>,
    exercise: String,
    sets: i64,
    reps: i64,
    weight: f64,
}

/// Validates the full row list. Missing fields are reported before negative
/// values, negative values before unparseable ones, matching the form's
/// notification order.
fn validate_rows(rows: &[DraftRow]) -> Result<Vec<ValidatedRow>, ValidationError> {
    if rows.iter().any(|r| !r.is_complete()) {
        return Err(ValidationError::MissingFields);
    }

    let is_negative = |s: &str| s.trim().parse::<f64>().map_or(false, |v| v < 0.0);
    if rows
        .iter()
        .any(|r| is_negative(&r.sets) || is_negative(&r.reps) || is_negative(&r.weight))
    {
        return Err(ValidationError::NegativeValue);
    }

    rows.iter()
        .map(|r| {
            let sets = r
                .sets
                .trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::InvalidNumber)?;
            let reps = r
                .reps
                .trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::InvalidNumber)?;
            // An empty weight defaults to 0.
            let weight = if r.weight.trim().is_empty() {
                0.0
            } else {
                r.weight
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ValidationError::InvalidNumber)?
            };
            Ok(ValidatedRow {
                id: r.id,
                exercise: r.exercise.trim().to_string(),
                sets,
                reps,
                weight,
            })
        })
        .collect()
}

/// One refresh of the history view: all workouts in the configured sort
/// order, with each workout's sets grouped and ordered for display.
#[derive(Debug, Clone)]
pub struct WorkoutHistory {
    pub workouts: Vec<Workout>,
    pub sets_by_workout: HashMap<i64, Vec<ExerciseSet>>,
}

pub struct AppService {
    pub config: Config,
    pub conn: Connection,
    pub settings: Settings,
    pub catalog: ExerciseCatalog,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or
    /// initialization fails. A missing or broken catalog file is not an
    /// error; it degrades to an empty suggestion list.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .context(format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        db::init_db(&conn).context("Failed to initialize database schema")?;

        let settings =
            settings::load_settings(&conn).context("Failed to load settings from database")?;

        let catalog_path = config.catalog_path.clone().unwrap_or_else(|| {
            db_path
                .parent()
                .map_or_else(|| PathBuf::from(CATALOG_FILE_NAME), Path::to_path_buf)
                .join(CATALOG_FILE_NAME)
        });
        let catalog = ExerciseCatalog::load(&catalog_path);

        Ok(Self {
            config,
            conn,
            settings,
            catalog,
            db_path,
            config_path,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Path of the scratch slot holding the in-progress draft.
    #[must_use]
    pub fn draft_path(&self) -> PathBuf {
        self.db_path
            .parent()
            .map_or_else(|| PathBuf::from(DRAFT_FILE_NAME), Path::to_path_buf)
            .join(DRAFT_FILE_NAME)
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    /// Flips the history sort order and persists the preference.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn toggle_sort_order(&mut self) -> Result<SortOrder, ConfigError> {
        self.config.sort_order = self.config.sort_order.toggled();
        self.save_config()?;
        Ok(self.config.sort_order)
    }

    // --- Workout Reconciler ---

    /// Validates and commits a full workout draft. Creates a new workout when
    /// the draft has no `workout_id`, otherwise reconciles the edited row
    /// list against storage: rows removed from the draft are deleted, rows
    /// with an id are updated in place, rows without one are inserted, and
    /// every position is rewritten to the row's current draft index. All
    /// writes happen in one transaction.
    ///
    /// Returns the workout's ID.
    /// # Errors
    /// `ValidationError` (wrapped) before any write; `DbError` variants if a
    /// storage call fails, in which case the transaction rolls back.
    pub fn save_workout(&mut self, workout_draft: &WorkoutDraft) -> Result<i64> {
        let validated = validate_rows(&workout_draft.rows)?;
        let date = workout_draft
            .date
            .unwrap_or_else(|| Local::now().date_naive());
        let note = workout_draft.note.as_deref();

        let tx = self.conn.transaction().map_err(DbError::Connection)?;

        let workout_id = match workout_draft.workout_id {
            None => {
                let id = db::insert_workout(&tx, date, note)?;
                for (index, row) in validated.iter().enumerate() {
                    db::insert_set(
                        &tx,
                        &db::NewSetData {
                            workout_id: id,
                            exercise: &row.exercise,
                            sets: row.sets,
                            reps: row.reps,
                            weight: row.weight,
                            position: index as i64,
                        },
                    )?;
                }
                id
            }
            Some(id) => {
                let stored = db::list_sets_for_workout(&tx, id)?;
                let draft_ids: Vec<i64> = validated.iter().filter_map(|r| r.id).collect();

                // Delete stored rows that were removed from the draft.
                for original in &stored {
                    if !draft_ids.contains(&original.id) {
                        db::delete_set(&tx, original.id)?;
                    }
                }

                // Update or insert, rewriting every position to the current
                // draft index whether or not it changed.
                for (index, row) in validated.iter().enumerate() {
                    match row.id {
                        Some(set_id) => {
                            db::update_set(
                                &tx,
                                set_id,
                                &row.exercise,
                                row.sets,
                                row.reps,
                                row.weight,
                                index as i64,
                            )?;
                        }
                        None => {
                            db::insert_set(
                                &tx,
                                &db::NewSetData {
                                    workout_id: id,
                                    exercise: &row.exercise,
                                    sets: row.sets,
                                    reps: row.reps,
                                    weight: row.weight,
                                    position: index as i64,
                                },
                            )?;
                        }
                    }
                }

                db::update_workout_header(&tx, id, date, note)?;
                id
            }
        };

        tx.commit().map_err(DbError::Connection)?;
        Ok(workout_id)
    }

    /// Re-reads the full history: workouts sorted by date per the persisted
    /// sort order, sets grouped by workout and ordered for display.
    /// # Errors
    /// Returns `anyhow::Error` wrapping DB errors.
    pub fn refresh(&self) -> Result<WorkoutHistory> {
        let mut workouts =
            db::list_workouts(&self.conn).context("Failed to list workouts")?;
        if self.config.sort_order == SortOrder::Desc {
            // Stable sort keeps insertion order among same-date workouts.
            workouts.sort_by(|a, b| b.date.cmp(&a.date));
        }
        let sets_by_workout =
            db::list_sets_grouped(&self.conn).context("Failed to group exercise sets")?;
        Ok(WorkoutHistory {
            workouts,
            sets_by_workout,
        })
    }

    /// Builds an edit draft over a stored workout, snapshotting its current
    /// rows for unsaved-changes detection.
    /// # Errors
    /// `DbError::WorkoutNotFound` if the id does not exist.
    pub fn begin_edit(&self, workout_id: i64) -> Result<WorkoutDraft> {
        let workout = db::get_workout(&self.conn, workout_id)?
            .ok_or(DbError::WorkoutNotFound(workout_id))?;
        let stored = db::list_sets_for_workout(&self.conn, workout_id)?;
        Ok(WorkoutDraft::for_edit(
            workout.id,
            workout.date,
            workout.note,
            &stored,
        ))
    }

    /// Deletes a workout and all its sets.
    /// # Errors
    /// Returns `anyhow::Error` if the id is unknown or DB deletion fails.
    pub fn delete_workout(&mut self, id: i64) -> Result<u64> {
        db::delete_workout(&mut self.conn, id)
            .with_context(|| format!("Failed to delete workout ID {id}"))
    }

    // --- Notes ---

    /// Writes the free-text note; the most recently updated record wins.
    /// # Errors
    /// Returns `anyhow::Error` wrapping DB errors.
    pub fn save_note(&self, content: &str) -> Result<i64> {
        db::upsert_note(&self.conn, content, Utc::now()).context("Failed to save note")
    }

    /// Retrieves the most recently updated note, if any.
    /// # Errors
    /// Returns `anyhow::Error` wrapping DB errors.
    pub fn get_note(&self) -> Result<Option<Note>> {
        db::get_latest_note(&self.conn).context("Failed to read note")
    }

    // --- Settings ---

    /// Persists new settings and reloads the in-memory copy from storage.
    /// # Errors
    /// Returns `anyhow::Error` wrapping DB errors.
    pub fn update_settings(&mut self, new_settings: &Settings) -> Result<()> {
        settings::save_settings(&self.conn, new_settings, Utc::now())
            .context("Failed to save settings")?;
        self.settings =
            settings::load_settings(&self.conn).context("Failed to reload settings")?;
        Ok(())
    }

    // --- Autocomplete ---

    /// Filters the exercise catalog by a text query.
    #[must_use]
    pub fn search_catalog(&self, query: &str) -> Vec<&CatalogEntry> {
        self.catalog.search(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(exercise: &str, sets: &str, reps: &str, weight: &str) -> DraftRow {
        DraftRow {
            id: None,
            exercise: exercise.to_string(),
            sets: sets.to_string(),
            reps: reps.to_string(),
            weight: weight.to_string(),
        }
    }

    #[test]
    fn missing_fields_reported_first() {
        // A missing field wins even when another row holds a negative value.
        let rows = vec![row("", "", "", ""), row("Squat", "-3", "5", "100")];
        assert_eq!(validate_rows(&rows), Err(ValidationError::MissingFields));
    }

    #[test]
    fn negative_reported_before_non_numeric() {
        let rows = vec![row("Squat", "-3", "abc", "100")];
        assert_eq!(validate_rows(&rows), Err(ValidationError::NegativeValue));
    }

    #[test]
    fn non_numeric_rejected() {
        let rows = vec![row("Squat", "3", "five", "100")];
        assert_eq!(validate_rows(&rows), Err(ValidationError::InvalidNumber));
        let rows = vec![row("Squat", "3", "5", "heavy")];
        assert_eq!(validate_rows(&rows), Err(ValidationError::InvalidNumber));
    }

    #[test]
    fn empty_weight_defaults_to_zero() {
        let rows = vec![row("Squat", "3", "5", "")];
        let validated = validate_rows(&rows).unwrap();
        assert_eq!(validated[0].weight, 0.0);
        assert_eq!(validated[0].sets, 3);
        assert_eq!(validated[0].reps, 5);
    }
}
