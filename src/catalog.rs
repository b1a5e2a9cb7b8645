//src/catalog.rs
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One entry of the static exercise catalog resource. `name` is the local
/// (Finnish) name, `name_en` the English one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub name_en: String,
    pub muscle: String,
}

impl CatalogEntry {
    /// Name to show in suggestion lists, honoring the language setting.
    #[must_use]
    pub fn display_name(&self, use_english_names: bool) -> &str {
        if use_english_names {
            &self.name_en
        } else {
            &self.name
        }
    }
}

/// Read-only list of known exercises, loaded once at startup and used only
/// for autocomplete suggestions.
#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    entries: Vec<CatalogEntry>,
}

impl ExerciseCatalog {
    /// Loads the catalog from a JSON file. Any failure (missing file, parse
    /// error) degrades silently to an empty catalog, so autocomplete simply
    /// shows no matches.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let entries = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { entries }
    }

    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Case-insensitive substring match across name, localized name and
    /// muscle group. An empty query returns every entry.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.name_en.to_lowercase().contains(&needle)
                    || e.muscle.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> ExerciseCatalog {
        ExerciseCatalog::from_entries(vec![
            CatalogEntry {
                name: "Kyykky".to_string(),
                name_en: "Squat".to_string(),
                muscle: "legs".to_string(),
            },
            CatalogEntry {
                name: "Penkkipunnerrus".to_string(),
                name_en: "Bench Press".to_string(),
                muscle: "chest".to_string(),
            },
        ])
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let catalog = sample_catalog();
        assert_eq!(catalog.search("SQUAT").len(), 1);
        assert_eq!(catalog.search("kyykky").len(), 1);
        assert_eq!(catalog.search("chest").len(), 1);
        assert_eq!(catalog.search("k").len(), 2); // substring match
        assert!(catalog.search("deadlift").is_empty());
    }

    #[test]
    fn load_failure_degrades_to_empty() {
        let catalog = ExerciseCatalog::load(Path::new("/nonexistent/exercises.json"));
        assert!(catalog.is_empty());
        assert!(catalog.search("anything").is_empty());
    }

    #[test]
    fn display_name_honors_language_setting() {
        let catalog = sample_catalog();
        let entry = catalog.search("squat")[0];
        assert_eq!(entry.display_name(false), "Kyykky");
        assert_eq!(entry.display_name(true), "Squat");
    }
}
