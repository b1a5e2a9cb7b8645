//src/db.rs
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use strum_macros::EnumIter;
use thiserror::Error;

// Custom Error type for DB operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Workout not found: ID {0}")]
    WorkoutNotFound(i64),
    #[error("Exercise set not found: ID {0}")]
    SetNotFound(i64),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database update failed: {0}")]
    UpdateFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
}

const DB_FILE_NAME: &str = "workouts.sqlite";

/// A logged workout session header. Sets are stored separately and keyed by
/// `workout_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: i64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// One exercise row inside a workout. `position` is NULL on rows written
/// before the column existed; see [`SetOrder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSet {
    pub id: i64,
    pub workout_id: i64,
    pub exercise: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub position: Option<i64>,
}

/// Sort key for sets within a workout, resolved once at read time.
/// Positioned rows come first in ascending `position`; legacy rows without a
/// position follow, ascending by id. The derived `Ord` encodes both rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetOrder {
    Position(i64),
    Legacy(i64),
}

impl ExerciseSet {
    #[must_use]
    pub fn order_key(&self) -> SetOrder {
        self.position
            .map_or(SetOrder::Legacy(self.id), SetOrder::Position)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NewSetData<'a> {
    pub workout_id: i64,
    pub exercise: &'a str,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub position: i64,
}

/// Free-text note, independent of workouts. The most recently updated record
/// wins when reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Keys of the persisted settings table. Serialized names match the stored
/// `key` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum SettingKey {
    UseEnglishNames,
    DefaultReps,
    DefaultSets,
    DefaultWeight,
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingKey::UseEnglishNames => write!(f, "useEnglishNames"),
            SettingKey::DefaultReps => write!(f, "defaultReps"),
            SettingKey::DefaultSets => write!(f, "defaultSets"),
            SettingKey::DefaultWeight => write!(f, "defaultWeight"),
        }
    }
}

/// Gets the path to the SQLite database file within the app's data directory.
pub fn get_db_path() -> Result<PathBuf, Error> {
    let data_dir = dirs::data_dir().ok_or(Error::DataDir)?;
    let app_dir = data_dir.join("workout-log"); // Same dir name as config
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, Error> {
    let conn = Connection::open(path).map_err(Error::Connection)?;
    Ok(conn)
}

/// Initializes the database tables if they don't exist.
/// Migrations are strictly additive; existing columns are never dropped.
pub fn init_db(conn: &Connection) -> Result<(), Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS workouts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL, -- calendar date, YYYY-MM-DD
            note TEXT
        )",
        [],
    )
    .map_err(Error::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            workout_id INTEGER NOT NULL,
            exercise TEXT NOT NULL,
            sets INTEGER NOT NULL,
            reps INTEGER NOT NULL,
            weight REAL NOT NULL DEFAULT 0,
            position INTEGER -- NULL on rows predating the column
        )",
        [],
    )
    .map_err(Error::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL, -- RFC3339
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(Error::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL UNIQUE,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(Error::Connection)?;

    // Indexes for common lookups
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date)",
        [],
    )
    .map_err(Error::Connection)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sets_workout_id ON sets(workout_id)",
        [],
    )
    .map_err(Error::Connection)?;

    // Add position column if it doesn't exist (for upgrading existing databases)
    add_position_column_if_not_exists(conn)?;

    Ok(())
}

/// Adds the position column to the sets table if it doesn't exist.
/// This is useful for users upgrading from a previous version.
fn add_position_column_if_not_exists(conn: &Connection) -> Result<(), Error> {
    let mut stmt = conn.prepare("PRAGMA table_info(sets)")?;
    let columns = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut position_exists = false;
    for column in columns {
        if let Ok(column_name) = column {
            if column_name == "position" {
                position_exists = true;
                break;
            }
        }
    }

    if !position_exists {
        conn.execute("ALTER TABLE sets ADD COLUMN position INTEGER", [])?;
    }

    Ok(())
}

// ---- Workout Functions ----

/// Inserts a new workout header row. Returns its ID.
pub fn insert_workout(
    conn: &Connection,
    date: NaiveDate,
    note: Option<&str>,
) -> Result<i64, Error> {
    conn.execute(
        "INSERT INTO workouts (date, note) VALUES (:date, :note)",
        named_params! {
            ":date": date.format("%Y-%m-%d").to_string(),
            ":note": note,
        },
    )
    .map_err(Error::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites a workout's date and note.
pub fn update_workout_header(
    conn: &Connection,
    id: i64,
    date: NaiveDate,
    note: Option<&str>,
) -> Result<u64, Error> {
    let rows_affected = conn
        .execute(
            "UPDATE workouts SET date = :date, note = :note WHERE id = :id",
            named_params! {
                ":date": date.format("%Y-%m-%d").to_string(),
                ":note": note,
                ":id": id,
            },
        )
        .map_err(Error::UpdateFailed)?;
    if rows_affected == 0 {
        Err(Error::WorkoutNotFound(id))
    } else {
        Ok(rows_affected as u64)
    }
}

/// Deletes a workout and all of its sets in a single transaction, so no
/// orphaned set rows can survive the delete.
pub fn delete_workout(conn: &mut Connection, id: i64) -> Result<u64, Error> {
    let tx = conn.transaction().map_err(Error::Connection)?;

    tx.execute("DELETE FROM sets WHERE workout_id = ?1", params![id])
        .map_err(Error::DeleteFailed)?;
    let rows_affected = tx
        .execute("DELETE FROM workouts WHERE id = ?1", params![id])
        .map_err(Error::DeleteFailed)?;

    tx.commit().map_err(Error::Connection)?;

    if rows_affected == 0 {
        Err(Error::WorkoutNotFound(id))
    } else {
        Ok(rows_affected as u64)
    }
}

fn map_row_to_workout(row: &Row) -> Result<Workout, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let date_str: String = row.get(1)?;
    let note: Option<String> = row.get(2)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Workout { id, date, note })
}

/// Lists all workouts, oldest date first (ties broken by insertion order).
pub fn list_workouts(conn: &Connection) -> Result<Vec<Workout>, Error> {
    let mut stmt = conn
        .prepare("SELECT id, date, note FROM workouts ORDER BY date ASC, id ASC")
        .map_err(Error::QueryFailed)?;
    let workout_iter = stmt
        .query_map([], map_row_to_workout)
        .map_err(Error::QueryFailed)?;

    workout_iter
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::QueryFailed)
}

/// Retrieves a single workout header by ID.
pub fn get_workout(conn: &Connection, id: i64) -> Result<Option<Workout>, Error> {
    let mut stmt = conn
        .prepare("SELECT id, date, note FROM workouts WHERE id = ?1")
        .map_err(Error::QueryFailed)?;
    stmt.query_row(params![id], map_row_to_workout)
        .optional()
        .map_err(Error::QueryFailed)
}

// ---- Exercise Set Functions ----

fn map_row_to_set(row: &Row) -> Result<ExerciseSet, rusqlite::Error> {
    Ok(ExerciseSet {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise: row.get(2)?,
        sets: row.get(3)?,
        reps: row.get(4)?,
        weight: row.get(5)?,
        position: row.get(6)?,
    })
}

/// Inserts one exercise set row. Returns its ID.
pub fn insert_set(conn: &Connection, data: &NewSetData) -> Result<i64, Error> {
    conn.execute(
        "INSERT INTO sets (workout_id, exercise, sets, reps, weight, position)
         VALUES (:workout_id, :exercise, :sets, :reps, :weight, :position)",
        named_params! {
            ":workout_id": data.workout_id,
            ":exercise": data.exercise,
            ":sets": data.sets,
            ":reps": data.reps,
            ":weight": data.weight,
            ":position": data.position,
        },
    )
    .map_err(Error::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

/// Updates an existing set row in place, rewriting every field including its
/// position.
pub fn update_set(
    conn: &Connection,
    id: i64,
    exercise: &str,
    sets: i64,
    reps: i64,
    weight: f64,
    position: i64,
) -> Result<u64, Error> {
    let rows_affected = conn
        .execute(
            "UPDATE sets
             SET exercise = :exercise, sets = :sets, reps = :reps,
                 weight = :weight, position = :position
             WHERE id = :id",
            named_params! {
                ":exercise": exercise,
                ":sets": sets,
                ":reps": reps,
                ":weight": weight,
                ":position": position,
                ":id": id,
            },
        )
        .map_err(Error::UpdateFailed)?;
    if rows_affected == 0 {
        Err(Error::SetNotFound(id))
    } else {
        Ok(rows_affected as u64)
    }
}

/// Deletes a single set row by ID.
pub fn delete_set(conn: &Connection, id: i64) -> Result<u64, Error> {
    let rows_affected = conn
        .execute("DELETE FROM sets WHERE id = ?1", params![id])
        .map_err(Error::DeleteFailed)?;
    if rows_affected == 0 {
        Err(Error::SetNotFound(id))
    } else {
        Ok(rows_affected as u64)
    }
}

/// Lists the sets of one workout, sorted by [`SetOrder`].
pub fn list_sets_for_workout(conn: &Connection, workout_id: i64) -> Result<Vec<ExerciseSet>, Error> {
    let mut stmt = conn
        .prepare(
            "SELECT id, workout_id, exercise, sets, reps, weight, position
             FROM sets WHERE workout_id = ?1",
        )
        .map_err(Error::QueryFailed)?;
    let set_iter = stmt
        .query_map(params![workout_id], map_row_to_set)
        .map_err(Error::QueryFailed)?;

    let mut rows = set_iter
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::QueryFailed)?;
    rows.sort_by_key(ExerciseSet::order_key);
    Ok(rows)
}

/// Lists all sets grouped by workout ID, each group sorted by [`SetOrder`].
pub fn list_sets_grouped(conn: &Connection) -> Result<HashMap<i64, Vec<ExerciseSet>>, Error> {
    let mut stmt = conn
        .prepare("SELECT id, workout_id, exercise, sets, reps, weight, position FROM sets")
        .map_err(Error::QueryFailed)?;
    let set_iter = stmt
        .query_map([], map_row_to_set)
        .map_err(Error::QueryFailed)?;

    let mut grouped: HashMap<i64, Vec<ExerciseSet>> = HashMap::new();
    for set in set_iter {
        let set = set.map_err(Error::QueryFailed)?;
        grouped.entry(set.workout_id).or_default().push(set);
    }
    for group in grouped.values_mut() {
        group.sort_by_key(ExerciseSet::order_key);
    }
    Ok(grouped)
}

// ---- Note Functions ----

fn map_row_to_note(row: &Row) -> Result<Note, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let content: String = row.get(1)?;
    let created_str: String = row.get(2)?;
    let updated_str: String = row.get(3)?;
    let parse = |s: &str, idx: usize| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    };
    Ok(Note {
        id,
        content,
        created_at: parse(&created_str, 2)?,
        updated_at: parse(&updated_str, 3)?,
    })
}

/// Retrieves the most recently updated note, if any.
pub fn get_latest_note(conn: &Connection) -> Result<Option<Note>, Error> {
    let mut stmt = conn
        .prepare(
            "SELECT id, content, created_at, updated_at FROM notes
             ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .map_err(Error::QueryFailed)?;
    stmt.query_row([], map_row_to_note)
        .optional()
        .map_err(Error::QueryFailed)
}

/// Writes the note content, updating the most recent record in place or
/// inserting the first one. Returns the note's ID.
pub fn upsert_note(conn: &Connection, content: &str, now: DateTime<Utc>) -> Result<i64, Error> {
    let now_str = now.to_rfc3339();
    if let Some(existing) = get_latest_note(conn)? {
        conn.execute(
            "UPDATE notes SET content = :content, updated_at = :updated_at WHERE id = :id",
            named_params! {
                ":content": content,
                ":updated_at": now_str,
                ":id": existing.id,
            },
        )
        .map_err(Error::UpdateFailed)?;
        Ok(existing.id)
    } else {
        conn.execute(
            "INSERT INTO notes (content, created_at, updated_at)
             VALUES (:content, :created_at, :updated_at)",
            named_params! {
                ":content": content,
                ":created_at": now_str,
                ":updated_at": now_str,
            },
        )
        .map_err(Error::InsertFailed)?;
        Ok(conn.last_insert_rowid())
    }
}

// ---- Settings Functions ----

/// Reads one setting value by key.
pub fn get_setting(conn: &Connection, key: SettingKey) -> Result<Option<String>, Error> {
    let mut stmt = conn
        .prepare("SELECT value FROM settings WHERE key = ?1")
        .map_err(Error::QueryFailed)?;
    stmt.query_row(params![key.to_string()], |row| row.get(0))
        .optional()
        .map_err(Error::QueryFailed)
}

/// Upserts one setting row, stamping `updated_at`.
pub fn set_setting(
    conn: &Connection,
    key: SettingKey,
    value: &str,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (:key, :value, :updated_at)
         ON CONFLICT(key) DO UPDATE SET value = :value, updated_at = :updated_at",
        named_params! {
            ":key": key.to_string(),
            ":value": value,
            ":updated_at": now.to_rfc3339(),
        },
    )
    .map_err(Error::UpdateFailed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positioned_rows_sort_before_legacy_rows() {
        let positioned = SetOrder::Position(5);
        let legacy = SetOrder::Legacy(1);
        assert!(positioned < legacy);
        assert!(SetOrder::Position(0) < SetOrder::Position(1));
        assert!(SetOrder::Legacy(3) < SetOrder::Legacy(7));
    }
}
