//src/settings.rs
//! User settings persisted as key/value rows in the settings table.
//! `AppService` is the single owner; components receive the loaded value by
//! reference instead of listening for a global change broadcast.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use strum::IntoEnumIterator;

use crate::db::{self, SettingKey};

/// Typed view over the persisted settings rows. Missing or unparseable rows
/// fall back to the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Show English exercise names in autocomplete suggestions.
    pub use_english_names: bool,
    /// Default number of sets for a fresh form row.
    pub default_sets: i64,
    /// Default number of reps for a fresh form row.
    pub default_reps: i64,
    /// Default weight for a fresh form row; `None` leaves the field empty.
    pub default_weight: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_english_names: false,
            default_sets: 2,
            default_reps: 8,
            default_weight: None,
        }
    }
}

impl Settings {
    fn value_for(&self, key: SettingKey) -> String {
        match key {
            SettingKey::UseEnglishNames => self.use_english_names.to_string(),
            SettingKey::DefaultReps => self.default_reps.to_string(),
            SettingKey::DefaultSets => self.default_sets.to_string(),
            SettingKey::DefaultWeight => self
                .default_weight
                .map_or_else(String::new, |w| w.to_string()),
        }
    }

    fn apply(&mut self, key: SettingKey, value: &str) {
        match key {
            SettingKey::UseEnglishNames => {
                if let Ok(b) = value.parse() {
                    self.use_english_names = b;
                }
            }
            SettingKey::DefaultReps => {
                if let Ok(n) = value.parse() {
                    self.default_reps = n;
                }
            }
            SettingKey::DefaultSets => {
                if let Ok(n) = value.parse() {
                    self.default_sets = n;
                }
            }
            SettingKey::DefaultWeight => {
                self.default_weight = value.parse().ok();
            }
        }
    }
}

/// Loads all settings, keeping defaults for keys that are absent.
pub fn load_settings(conn: &Connection) -> Result<Settings, db::Error> {
    let mut settings = Settings::default();
    for key in SettingKey::iter() {
        if let Some(value) = db::get_setting(conn, key)? {
            settings.apply(key, &value);
        }
    }
    Ok(settings)
}

/// Upserts every settings row, stamping each with `now`.
pub fn save_settings(
    conn: &Connection,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<(), db::Error> {
    for key in SettingKey::iter() {
        db::set_setting(conn, key, &settings.value_for(key), now)?;
    }
    Ok(())
}
