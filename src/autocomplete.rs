//src/autocomplete.rs
//! Per-row exercise suggestion state. At most one row's suggestion list is
//! open at a time; the filter text tracks that row's exercise value.

use crate::catalog::{CatalogEntry, ExerciseCatalog};
use crate::draft::{RowField, WorkoutDraft};

#[derive(Debug, Clone, Default)]
pub struct ExerciseDropdown {
    open_row: Option<usize>,
    filter: String,
}

impl ExerciseDropdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn open_row(&self) -> Option<usize> {
        self.open_row
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Opens the suggestion list for one row, seeding the filter with that
    /// row's current exercise value. Any previously open row is closed.
    pub fn open(&mut self, row: usize, draft: &WorkoutDraft) -> bool {
        let Some(current) = draft.rows.get(row) else {
            return false;
        };
        self.open_row = Some(row);
        self.filter = current.exercise.clone();
        true
    }

    /// Typing into the open row: updates the row's exercise value and the
    /// filter text together.
    pub fn input(&mut self, draft: &mut WorkoutDraft, text: &str) -> bool {
        let Some(row) = self.open_row else {
            return false;
        };
        if !draft.set_field(row, RowField::Exercise, text) {
            return false;
        }
        self.filter = text.to_string();
        true
    }

    /// Current suggestions for the open row; empty when nothing is open.
    #[must_use]
    pub fn suggestions<'a>(&self, catalog: &'a ExerciseCatalog) -> Vec<&'a CatalogEntry> {
        if self.open_row.is_none() {
            return Vec::new();
        }
        catalog.search(&self.filter)
    }

    /// Writes the chosen name into the open row and closes the list.
    pub fn select(&mut self, draft: &mut WorkoutDraft, chosen_name: &str) -> bool {
        let Some(row) = self.open_row else {
            return false;
        };
        if !draft.set_field(row, RowField::Exercise, chosen_name) {
            return false;
        }
        self.close();
        true
    }

    /// Dismissal (e.g. a click outside the input and its list).
    pub fn close(&mut self) {
        self.open_row = None;
        self.filter.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::settings::Settings;

    fn catalog() -> ExerciseCatalog {
        ExerciseCatalog::from_entries(vec![
            CatalogEntry {
                name: "Kyykky".to_string(),
                name_en: "Squat".to_string(),
                muscle: "legs".to_string(),
            },
            CatalogEntry {
                name: "Maastaveto".to_string(),
                name_en: "Deadlift".to_string(),
                muscle: "back".to_string(),
            },
        ])
    }

    #[test]
    fn only_one_row_open_at_a_time() {
        let settings = Settings::default();
        let mut draft = WorkoutDraft::new(&settings);
        draft.add_row(&settings);
        let mut dropdown = ExerciseDropdown::new();

        assert!(dropdown.open(0, &draft));
        assert_eq!(dropdown.open_row(), Some(0));
        assert!(dropdown.open(1, &draft));
        assert_eq!(dropdown.open_row(), Some(1));
    }

    #[test]
    fn opening_seeds_filter_from_row_value() {
        let settings = Settings::default();
        let mut draft = WorkoutDraft::new(&settings);
        draft.set_field(0, RowField::Exercise, "Kyy");
        let mut dropdown = ExerciseDropdown::new();

        dropdown.open(0, &draft);
        assert_eq!(dropdown.filter(), "Kyy");
        assert_eq!(dropdown.suggestions(&catalog()).len(), 1);
    }

    #[test]
    fn typing_updates_row_and_filter_together() {
        let settings = Settings::default();
        let mut draft = WorkoutDraft::new(&settings);
        let mut dropdown = ExerciseDropdown::new();
        dropdown.open(0, &draft);

        assert!(dropdown.input(&mut draft, "maasta"));
        assert_eq!(draft.rows[0].exercise, "maasta");
        assert_eq!(dropdown.filter(), "maasta");
        let catalog = catalog();
        let suggestions = dropdown.suggestions(&catalog);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name_en, "Deadlift");
    }

    #[test]
    fn select_writes_name_and_closes() {
        let settings = Settings::default();
        let mut draft = WorkoutDraft::new(&settings);
        let mut dropdown = ExerciseDropdown::new();
        dropdown.open(0, &draft);

        assert!(dropdown.select(&mut draft, "Maastaveto"));
        assert_eq!(draft.rows[0].exercise, "Maastaveto");
        assert_eq!(dropdown.open_row(), None);
        assert!(dropdown.suggestions(&catalog()).is_empty());
    }

    #[test]
    fn input_without_open_row_is_rejected() {
        let settings = Settings::default();
        let mut draft = WorkoutDraft::new(&settings);
        let mut dropdown = ExerciseDropdown::new();
        assert!(!dropdown.input(&mut draft, "anything"));
    }
}
