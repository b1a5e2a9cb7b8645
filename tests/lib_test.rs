// tests/lib_test.rs
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection};
use workout_log_lib::{
    db, AppService, CatalogEntry, Config, DraftRow, ExerciseCatalog, RowField, Settings,
    SortOrder, ValidationError, WorkoutDraft,
};

fn catalog_entry(name: &str, name_en: &str, muscle: &str) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        name_en: name_en.to_string(),
        muscle: muscle.to_string(),
    }
}

fn create_test_service(test_name: &str) -> AppService {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    db::init_db(&conn).expect("Failed to initialize database schema");
    AppService {
        config: Config::default(),
        conn,
        settings: Settings::default(),
        catalog: ExerciseCatalog::from_entries(vec![
            catalog_entry("Kyykky", "Squat", "legs"),
            catalog_entry("Penkkipunnerrus", "Bench Press", "chest"),
            catalog_entry("Maastaveto", "Deadlift", "back"),
        ]),
        db_path: ":memory:".into(),
        config_path: std::env::temp_dir().join(format!("workout-log-{test_name}-config.toml")),
    }
}

fn draft_row(exercise: &str, sets: &str, reps: &str, weight: &str) -> DraftRow {
    DraftRow {
        id: None,
        exercise: exercise.to_string(),
        sets: sets.to_string(),
        reps: reps.to_string(),
        weight: weight.to_string(),
    }
}

fn new_draft(rows: Vec<DraftRow>, date: Option<NaiveDate>) -> WorkoutDraft {
    let mut draft = WorkoutDraft::new(&Settings::default());
    draft.rows = rows;
    draft.date = date;
    draft
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn count_sets(conn: &Connection, workout_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sets WHERE workout_id = ?1",
        params![workout_id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn test_create_workout_persists_rows_in_order() -> Result<()> {
    let mut service = create_test_service("create-order");
    let mut draft = new_draft(
        vec![
            draft_row("Squat", "3", "5", "100"),
            draft_row("Bench Press", "3", "8", "60"),
            draft_row("Deadlift", "1", "5", "140"),
        ],
        Some(date(2024, 3, 1)),
    );
    draft.note = Some("heavy day".to_string());

    let id = service.save_workout(&draft)?;

    let workout = db::get_workout(&service.conn, id)?.expect("workout should exist");
    assert_eq!(workout.date, date(2024, 3, 1));
    assert_eq!(workout.note.as_deref(), Some("heavy day"));

    let sets = db::list_sets_for_workout(&service.conn, id)?;
    assert_eq!(sets.len(), 3);
    let names: Vec<&str> = sets.iter().map(|s| s.exercise.as_str()).collect();
    assert_eq!(names, vec!["Squat", "Bench Press", "Deadlift"]);
    let positions: Vec<Option<i64>> = sets.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);
    Ok(())
}

#[test]
fn test_save_without_date_uses_today() -> Result<()> {
    let mut service = create_test_service("default-date");
    let draft = new_draft(vec![draft_row("Squat", "3", "5", "100")], None);
    let id = service.save_workout(&draft)?;
    let workout = db::get_workout(&service.conn, id)?.unwrap();
    assert_eq!(workout.date, Local::now().date_naive());
    Ok(())
}

#[test]
fn test_empty_weight_is_stored_as_zero() -> Result<()> {
    let mut service = create_test_service("empty-weight");
    let draft = new_draft(
        vec![draft_row("Pull Up", "3", "10", "")],
        Some(date(2024, 3, 1)),
    );
    let id = service.save_workout(&draft)?;
    let sets = db::list_sets_for_workout(&service.conn, id)?;
    assert_eq!(sets[0].weight, 0.0);
    Ok(())
}

#[test]
fn test_validation_failure_writes_nothing() -> Result<()> {
    let mut service = create_test_service("validation-blocks");

    // Missing exercise name on the second row.
    let draft = new_draft(
        vec![
            draft_row("Squat", "3", "5", "100"),
            draft_row("", "3", "8", "60"),
        ],
        Some(date(2024, 3, 1)),
    );
    let err = service.save_workout(&draft).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::MissingFields)
    );

    // Negative value wins over the non-numeric field in the same list.
    let draft = new_draft(
        vec![draft_row("Squat", "-3", "abc", "100")],
        Some(date(2024, 3, 1)),
    );
    let err = service.save_workout(&draft).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::NegativeValue)
    );

    let draft = new_draft(
        vec![draft_row("Squat", "3", "five", "100")],
        Some(date(2024, 3, 1)),
    );
    let err = service.save_workout(&draft).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::InvalidNumber)
    );

    let workouts = db::list_workouts(&service.conn)?;
    assert!(workouts.is_empty(), "failed saves must not write");
    Ok(())
}

#[test]
fn test_edit_reconciles_deletions_updates_and_inserts() -> Result<()> {
    let mut service = create_test_service("edit-reconcile");
    let draft = new_draft(
        vec![
            draft_row("Squat", "3", "5", "100"),
            draft_row("Bench Press", "3", "8", "60"),
        ],
        Some(date(2024, 3, 1)),
    );
    let id = service.save_workout(&draft)?;
    let stored = db::list_sets_for_workout(&service.conn, id)?;
    let squat_id = stored[0].id;
    let bench_id = stored[1].id;

    // Drop Squat, bump the Bench Press weight, append a new Row exercise.
    let mut edit = service.begin_edit(id)?;
    assert!(edit.remove_row(0, &service.settings));
    edit.set_field(0, RowField::Weight, "62.5");
    let new_index = edit.add_row(&service.settings);
    edit.set_field(new_index, RowField::Exercise, "Barbell Row");
    edit.set_field(new_index, RowField::Weight, "70");

    service.save_workout(&edit)?;

    let after = db::list_sets_for_workout(&service.conn, id)?;
    assert_eq!(after.len(), 2);
    assert!(after.iter().all(|s| s.id != squat_id));

    assert_eq!(after[0].id, bench_id, "kept row updated in place");
    assert_eq!(after[0].weight, 62.5);
    assert_eq!(after[0].position, Some(0));

    assert_eq!(after[1].exercise, "Barbell Row");
    assert_eq!(after[1].position, Some(1));
    assert_ne!(after[1].id, bench_id);
    Ok(())
}

#[test]
fn test_edit_overwrites_date_and_note() -> Result<()> {
    let mut service = create_test_service("edit-header");
    let draft = new_draft(
        vec![draft_row("Squat", "3", "5", "100")],
        Some(date(2024, 3, 1)),
    );
    let id = service.save_workout(&draft)?;

    let mut edit = service.begin_edit(id)?;
    assert!(!edit.has_changes());
    edit.date = Some(date(2024, 3, 2));
    edit.note = Some("moved to Saturday".to_string());
    assert!(edit.has_changes());

    service.save_workout(&edit)?;
    let workout = db::get_workout(&service.conn, id)?.unwrap();
    assert_eq!(workout.date, date(2024, 3, 2));
    assert_eq!(workout.note.as_deref(), Some("moved to Saturday"));
    Ok(())
}

#[test]
fn test_begin_edit_unknown_id_fails() {
    let service = create_test_service("edit-missing");
    assert!(service.begin_edit(999).is_err());
}

#[test]
fn test_delete_workout_cascades_to_sets() -> Result<()> {
    let mut service = create_test_service("delete-cascade");
    let first = service.save_workout(&new_draft(
        vec![draft_row("Squat", "3", "5", "100")],
        Some(date(2024, 3, 1)),
    ))?;
    let second = service.save_workout(&new_draft(
        vec![
            draft_row("Bench Press", "3", "8", "60"),
            draft_row("Barbell Row", "3", "8", "70"),
        ],
        Some(date(2024, 3, 2)),
    ))?;

    service.delete_workout(first)?;

    assert!(db::get_workout(&service.conn, first)?.is_none());
    assert_eq!(count_sets(&service.conn, first), 0, "no orphaned sets");
    assert_eq!(count_sets(&service.conn, second), 2);

    assert!(service.delete_workout(first).is_err(), "already deleted");
    Ok(())
}

#[test]
fn test_legacy_rows_without_position_sort_last() -> Result<()> {
    let service = create_test_service("legacy-order");
    let id = db::insert_workout(&service.conn, date(2024, 3, 1), None)?;

    // A row written before the position column existed.
    service.conn.execute(
        "INSERT INTO sets (workout_id, exercise, sets, reps, weight, position)
         VALUES (?1, 'Old Row', 3, 8, 50, NULL)",
        params![id],
    )?;
    db::insert_set(
        &service.conn,
        &db::NewSetData {
            workout_id: id,
            exercise: "New Row",
            sets: 3,
            reps: 8,
            weight: 60.0,
            position: 0,
        },
    )?;

    let sets = db::list_sets_for_workout(&service.conn, id)?;
    let names: Vec<&str> = sets.iter().map(|s| s.exercise.as_str()).collect();
    assert_eq!(names, vec!["New Row", "Old Row"]);
    Ok(())
}

#[test]
fn test_history_respects_sort_order() -> Result<()> {
    let mut service = create_test_service("history-sort");
    service.save_workout(&new_draft(
        vec![draft_row("Squat", "3", "5", "100")],
        Some(date(2024, 3, 1)),
    ))?;
    service.save_workout(&new_draft(
        vec![draft_row("Bench Press", "3", "8", "60")],
        Some(date(2024, 3, 5)),
    ))?;

    // Newest first by default.
    let history = service.refresh()?;
    assert_eq!(history.workouts[0].date, date(2024, 3, 5));
    assert_eq!(history.workouts[1].date, date(2024, 3, 1));
    assert_eq!(history.sets_by_workout.len(), 2);

    let toggled = service.toggle_sort_order()?;
    assert_eq!(toggled, SortOrder::Asc);
    let history = service.refresh()?;
    assert_eq!(history.workouts[0].date, date(2024, 3, 1));

    // The preference round-trips through the config file.
    let reloaded = workout_log_lib::load_config_util(&service.config_path)?;
    assert_eq!(reloaded.sort_order, SortOrder::Asc);
    std::fs::remove_file(&service.config_path).ok();
    Ok(())
}

#[test]
fn test_note_updates_in_place() -> Result<()> {
    let service = create_test_service("notes");
    assert!(service.get_note()?.is_none());

    let first_id = service.save_note("drink more water")?;
    let second_id = service.save_note("drink more water, stretch")?;
    assert_eq!(first_id, second_id, "note is overwritten, not duplicated");

    let note = service.get_note()?.unwrap();
    assert_eq!(note.content, "drink more water, stretch");
    assert!(note.updated_at >= note.created_at);
    Ok(())
}

#[test]
fn test_settings_round_trip() -> Result<()> {
    let mut service = create_test_service("settings");
    assert_eq!(service.settings, Settings::default());

    let new_settings = Settings {
        use_english_names: true,
        default_sets: 5,
        default_reps: 3,
        default_weight: Some(20.0),
    };
    service.update_settings(&new_settings)?;
    assert_eq!(service.settings, new_settings);

    // A fresh read from the same database sees the stored values.
    let reloaded = workout_log_lib::settings::load_settings(&service.conn)?;
    assert_eq!(reloaded, new_settings);

    // New draft rows pick up the changed defaults.
    let draft = WorkoutDraft::new(&service.settings);
    assert_eq!(draft.rows[0].sets, "5");
    assert_eq!(draft.rows[0].reps, "3");
    assert_eq!(draft.rows[0].weight, "20");
    Ok(())
}

#[test]
fn test_catalog_search_matches_either_language() {
    let service = create_test_service("catalog-search");

    let by_native = service.search_catalog("kyyk");
    assert_eq!(by_native.len(), 1);
    assert_eq!(by_native[0].name, "Kyykky");

    let by_english = service.search_catalog("bench");
    assert_eq!(by_english.len(), 1);
    assert_eq!(by_english[0].display_name(true), "Bench Press");
    assert_eq!(by_english[0].display_name(false), "Penkkipunnerrus");

    assert_eq!(service.search_catalog("").len(), 3);
    assert!(service.search_catalog("yoga").is_empty());
}
