//src/draft.rs
//! In-progress workout form state. The draft is the editable row list behind
//! both the new-workout form and the inline history editor; every mutation is
//! persisted to a scratch file so an interrupted session can be resumed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::db::ExerciseSet;
use crate::settings::Settings;

pub const DRAFT_FILE_NAME: &str = "draft.json";

/// Editable fields of a draft row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Exercise,
    Sets,
    Reps,
    Weight,
}

/// One editable exercise row. Numeric fields stay as raw strings until save
/// time; validation parses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRow {
    pub id: Option<i64>,
    pub exercise: String,
    pub sets: String,
    pub reps: String,
    pub weight: String,
}

impl DraftRow {
    /// A fresh row pre-populated from the user's default values.
    #[must_use]
    pub fn with_defaults(settings: &Settings) -> Self {
        Self {
            id: None,
            exercise: String::new(),
            sets: settings.default_sets.to_string(),
            reps: settings.default_reps.to_string(),
            weight: settings
                .default_weight
                .map_or_else(String::new, |w| w.to_string()),
        }
    }

    /// Rows missing exercise, sets or reps are incomplete; they fail
    /// validation on save and are skipped when creating a workout.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.exercise.trim().is_empty()
            && !self.sets.trim().is_empty()
            && !self.reps.trim().is_empty()
    }
}

impl From<&ExerciseSet> for DraftRow {
    fn from(set: &ExerciseSet) -> Self {
        Self {
            id: Some(set.id),
            exercise: set.exercise.clone(),
            sets: set.sets.to_string(),
            reps: set.reps.to_string(),
            weight: set.weight.to_string(),
        }
    }
}

/// Snapshot of the state when editing began, for unsaved-changes detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EditSnapshot {
    rows: Vec<DraftRow>,
    date: Option<NaiveDate>,
    note: Option<String>,
}

/// The editable workout: ordered rows plus the session date and note.
/// `workout_id` is set while editing a stored workout, `None` for a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDraft {
    pub workout_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub rows: Vec<DraftRow>,
    snapshot: Option<EditSnapshot>,
}

impl WorkoutDraft {
    /// A new-workout draft seeded with a single default row, so the form
    /// never starts empty.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            workout_id: None,
            date: None,
            note: None,
            rows: vec![DraftRow::with_defaults(settings)],
            snapshot: None,
        }
    }

    /// An edit draft over a stored workout, snapshotting the original rows,
    /// date and note for later change detection.
    #[must_use]
    pub fn for_edit(
        workout_id: i64,
        date: NaiveDate,
        note: Option<String>,
        stored_sets: &[ExerciseSet],
    ) -> Self {
        let rows: Vec<DraftRow> = stored_sets.iter().map(DraftRow::from).collect();
        let snapshot = EditSnapshot {
            rows: rows.clone(),
            date: Some(date),
            note: note.clone(),
        };
        Self {
            workout_id: Some(workout_id),
            date: Some(date),
            note,
            rows,
            snapshot: Some(snapshot),
        }
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.workout_id.is_some()
    }

    /// Appends a row pre-populated from the default values. Returns the new
    /// row's index.
    pub fn add_row(&mut self, settings: &Settings) -> usize {
        self.rows.push(DraftRow::with_defaults(settings));
        self.rows.len() - 1
    }

    /// Removes the row at `index`. In new-workout mode a fresh default row is
    /// substituted when the list would become empty.
    pub fn remove_row(&mut self, index: usize, settings: &Settings) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        if self.rows.is_empty() && !self.is_editing() {
            self.rows.push(DraftRow::with_defaults(settings));
        }
        true
    }

    /// Writes one field of one row.
    pub fn set_field(&mut self, index: usize, field: RowField, value: &str) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        match field {
            RowField::Exercise => row.exercise = value.to_string(),
            RowField::Sets => row.sets = value.to_string(),
            RowField::Reps => row.reps = value.to_string(),
            RowField::Weight => row.weight = value.to_string(),
        }
        true
    }

    /// Moves a row to a new index. Persisted positions are derived from the
    /// final row order at save time, not here.
    pub fn move_row(&mut self, from: usize, to: usize) -> bool {
        if from >= self.rows.len() || to >= self.rows.len() {
            return false;
        }
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        true
    }

    /// Index of the next row without an exercise name, if any. Used by the
    /// interactive surface to decide where focus moves after a removal.
    #[must_use]
    pub fn next_empty_row(&self) -> Option<usize> {
        self.rows.iter().position(|r| r.exercise.trim().is_empty())
    }

    /// Field-level diff against the edit snapshot. A draft without a
    /// snapshot (new workout) always counts as changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.snapshot {
            Some(snap) => {
                self.rows != snap.rows || self.date != snap.date || self.note != snap.note
            }
            None => true,
        }
    }
}

/// Loads the scratch draft if one exists and parses, otherwise seeds a fresh
/// new-workout draft. Corrupt files fall back the same way as missing ones.
#[must_use]
pub fn load_draft(path: &Path, settings: &Settings) -> WorkoutDraft {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_else(|| WorkoutDraft::new(settings))
}

/// Serializes the draft to the scratch file. Called after every mutation.
pub fn save_draft(path: &Path, draft: &WorkoutDraft) -> std::io::Result<()> {
    let content = serde_json::to_string(draft)?;
    fs::write(path, content)
}

/// Removes the scratch file. Called on successful save and on cancel.
pub fn clear_draft(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn new_draft_starts_with_one_default_row() {
        let settings = test_settings();
        let draft = WorkoutDraft::new(&settings);
        assert_eq!(draft.rows.len(), 1);
        assert_eq!(draft.rows[0].sets, "2");
        assert_eq!(draft.rows[0].reps, "8");
        assert_eq!(draft.rows[0].weight, "");
        assert!(!draft.rows[0].is_complete());
    }

    #[test]
    fn removing_last_row_substitutes_a_default_row() {
        let settings = test_settings();
        let mut draft = WorkoutDraft::new(&settings);
        draft.set_field(0, RowField::Exercise, "Squat");
        assert!(draft.remove_row(0, &settings));
        assert_eq!(draft.rows.len(), 1);
        assert!(draft.rows[0].exercise.is_empty());
    }

    #[test]
    fn move_row_reorders() {
        let settings = test_settings();
        let mut draft = WorkoutDraft::new(&settings);
        draft.set_field(0, RowField::Exercise, "A");
        draft.add_row(&settings);
        draft.set_field(1, RowField::Exercise, "B");
        draft.add_row(&settings);
        draft.set_field(2, RowField::Exercise, "C");

        assert!(draft.move_row(2, 0));
        let names: Vec<&str> = draft.rows.iter().map(|r| r.exercise.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        assert!(!draft.move_row(5, 0));
    }

    #[test]
    fn edit_snapshot_detects_field_level_changes() {
        use crate::db::ExerciseSet;
        let stored = vec![ExerciseSet {
            id: 1,
            workout_id: 7,
            exercise: "Squat".to_string(),
            sets: 3,
            reps: 5,
            weight: 100.0,
            position: Some(0),
        }];
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut draft = WorkoutDraft::for_edit(7, date, None, &stored);
        assert!(!draft.has_changes());

        draft.set_field(0, RowField::Weight, "105");
        assert!(draft.has_changes());

        draft.set_field(0, RowField::Weight, "100");
        assert!(!draft.has_changes());

        draft.note = Some("felt strong".to_string());
        assert!(draft.has_changes());
    }

    #[test]
    fn draft_round_trips_through_scratch_file() {
        let settings = test_settings();
        let mut draft = WorkoutDraft::new(&settings);
        draft.set_field(0, RowField::Exercise, "Squat");
        draft.date = NaiveDate::from_ymd_opt(2024, 1, 1);

        let path = std::env::temp_dir().join("workout-log-draft-test.json");
        save_draft(&path, &draft).unwrap();
        let loaded = load_draft(&path, &settings);
        assert_eq!(loaded, draft);

        clear_draft(&path).unwrap();
        let fresh = load_draft(&path, &settings);
        assert!(fresh.workout_id.is_none());
        assert_eq!(fresh.rows.len(), 1);
        assert!(fresh.rows[0].exercise.is_empty());
    }

    #[test]
    fn corrupt_scratch_file_falls_back_to_default_row() {
        let settings = test_settings();
        let path = std::env::temp_dir().join("workout-log-draft-corrupt-test.json");
        fs::write(&path, "{not json").unwrap();
        let draft = load_draft(&path, &settings);
        assert_eq!(draft.rows.len(), 1);
        assert!(draft.rows[0].exercise.is_empty());
        clear_draft(&path).unwrap();
    }
}
