//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::stdout;

use workout_log_lib::{
    clear_draft, load_draft, parse_color, save_draft, AppService, ExerciseSet, RowField, Settings,
    SortOrder, Workout, WorkoutDraft, WorkoutHistory,
};

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args();

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Initialize the application service (loads config, connects to DB)
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let draft_path = service.draft_path();
    let header_color = header_color(&service);

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            // This case is handled above, but keep it exhaustive
            unreachable!("Completion generation should have exited already");
        }

        // --- Draft (session form) commands ---
        cli::Commands::Add {
            exercise,
            sets,
            reps,
            weight,
        } => {
            let mut draft = load_draft(&draft_path, &service.settings);
            // Fill the first empty row before appending a new one, the way
            // the form focuses the empty row that is already there.
            let index = draft
                .next_empty_row()
                .unwrap_or_else(|| draft.add_row(&service.settings));
            if let Some(name) = exercise {
                draft.set_field(index, RowField::Exercise, &name);
            }
            if let Some(s) = sets {
                draft.set_field(index, RowField::Sets, &s);
            }
            if let Some(r) = reps {
                draft.set_field(index, RowField::Reps, &r);
            }
            if let Some(w) = weight {
                draft.set_field(index, RowField::Weight, &w);
            }
            save_draft(&draft_path, &draft).context("Failed to write draft")?;
            println!("Added draft row {index}.");
        }
        cli::Commands::RemoveRow { index } => {
            let mut draft = load_draft(&draft_path, &service.settings);
            if !draft.remove_row(index, &service.settings) {
                bail!("No draft row at index {index}.");
            }
            save_draft(&draft_path, &draft).context("Failed to write draft")?;
            println!("Removed draft row {index}.");
            if draft.is_editing() {
                match draft.next_empty_row() {
                    Some(next) => println!("Next empty row: {next}."),
                    None => println!("No empty rows left."),
                }
            }
        }
        cli::Commands::MoveRow { from, to } => {
            let mut draft = load_draft(&draft_path, &service.settings);
            if !draft.move_row(from, to) {
                bail!("Cannot move row {from} to {to}: index out of range.");
            }
            save_draft(&draft_path, &draft).context("Failed to write draft")?;
            println!("Moved row {from} to {to}.");
        }
        cli::Commands::SetRow {
            index,
            exercise,
            sets,
            reps,
            weight,
        } => {
            let mut draft = load_draft(&draft_path, &service.settings);
            if index >= draft.rows.len() {
                bail!("No draft row at index {index}.");
            }
            if let Some(name) = exercise {
                draft.set_field(index, RowField::Exercise, &name);
            }
            if let Some(s) = sets {
                draft.set_field(index, RowField::Sets, &s);
            }
            if let Some(r) = reps {
                draft.set_field(index, RowField::Reps, &r);
            }
            if let Some(w) = weight {
                draft.set_field(index, RowField::Weight, &w);
            }
            save_draft(&draft_path, &draft).context("Failed to write draft")?;
            println!("Updated draft row {index}.");
        }
        cli::Commands::Date { date } => {
            let mut draft = load_draft(&draft_path, &service.settings);
            draft.date = Some(date);
            save_draft(&draft_path, &draft).context("Failed to write draft")?;
            println!("Draft date set to {date}.");
        }
        cli::Commands::DraftNote { text } => {
            let mut draft = load_draft(&draft_path, &service.settings);
            draft.note = if text.is_empty() { None } else { Some(text) };
            save_draft(&draft_path, &draft).context("Failed to write draft")?;
            println!("Draft note updated.");
        }
        cli::Commands::Show => {
            let draft = load_draft(&draft_path, &service.settings);
            print_draft(&draft, header_color);
        }
        cli::Commands::Save => {
            let draft = load_draft(&draft_path, &service.settings);
            if draft.is_editing() && !draft.has_changes() {
                println!("No changes to save.");
                return Ok(());
            }
            match service.save_workout(&draft) {
                Ok(id) => {
                    clear_draft(&draft_path).context("Failed to clear draft")?;
                    if draft.is_editing() {
                        println!("Workout ID {id} updated.");
                    } else {
                        println!("Workout saved (ID: {id}).");
                    }
                }
                Err(e) => bail!("Error saving workout: {e}"),
            }
        }
        cli::Commands::Cancel => {
            clear_draft(&draft_path).context("Failed to clear draft")?;
            println!("Draft discarded.");
        }
        cli::Commands::Edit { id } => {
            let draft = service
                .begin_edit(id)
                .with_context(|| format!("Cannot edit workout ID {id}"))?;
            save_draft(&draft_path, &draft).context("Failed to write draft")?;
            println!("Editing workout ID {id}. Use `show`, `set-row`, `save`.");
        }

        // --- History commands ---
        cli::Commands::List { export_csv } => {
            let history = service.refresh().context("Failed to load history")?;
            if history.workouts.is_empty() {
                println!("No workouts logged yet.");
            } else if export_csv {
                print_history_csv(&history)?;
            } else {
                for workout in &history.workouts {
                    let sets = history
                        .sets_by_workout
                        .get(&workout.id)
                        .map_or(&[] as &[ExerciseSet], Vec::as_slice);
                    print_workout_table(workout, sets, header_color);
                }
            }
        }
        cli::Commands::Sort => {
            let order = service
                .toggle_sort_order()
                .context("Failed to persist sort order")?;
            let label = match order {
                SortOrder::Desc => "newest first",
                SortOrder::Asc => "oldest first",
            };
            println!("History sort order: {label}. Config updated.");
        }
        cli::Commands::DeleteWorkout { id } => match service.delete_workout(id) {
            Ok(_) => println!("Deleted workout ID {id} and all of its sets."),
            Err(e) => bail!("Error deleting workout ID {id}: {e}"),
        },

        // --- Notes commands ---
        cli::Commands::SetNote { content } => {
            let id = service.save_note(&content)?;
            println!("Note saved (ID: {id}).");
        }
        cli::Commands::ShowNote => match service.get_note()? {
            Some(note) => {
                println!("{}", note.content);
                println!("(updated {})", note.updated_at.format("%Y-%m-%d %H:%M"));
            }
            None => println!("No note yet. Use `set-note` to write one."),
        },

        // --- Settings commands ---
        cli::Commands::ShowSettings => print_settings(&service.settings),
        cli::Commands::SetSettings {
            use_english_names,
            default_sets,
            default_reps,
            default_weight,
        } => {
            let mut new_settings = service.settings.clone();
            if let Some(b) = use_english_names {
                new_settings.use_english_names = b;
            }
            if let Some(s) = default_sets {
                new_settings.default_sets = s;
            }
            if let Some(r) = default_reps {
                new_settings.default_reps = r;
            }
            if let Some(w) = default_weight {
                new_settings.default_weight = if w.trim().is_empty() {
                    None
                } else {
                    Some(w.trim().parse().context("Invalid default weight")?)
                };
            }
            service.update_settings(&new_settings)?;
            println!("Settings updated.");
            print_settings(&service.settings);
        }

        // --- Catalog commands ---
        cli::Commands::Search { query } => {
            let matches = service.search_catalog(&query);
            if matches.is_empty() {
                println!("No matching exercises.");
            } else {
                let use_english = service.settings.use_english_names;
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec![
                        Cell::new("Exercise").fg(header_color),
                        Cell::new("Muscle").fg(header_color),
                    ]);
                for entry in matches {
                    table.add_row(vec![
                        Cell::new(entry.display_name(use_english)),
                        Cell::new(&entry.muscle),
                    ]);
                }
                println!("{table}");
            }
        }

        cli::Commands::DbPath => {
            println!("{}", service.get_db_path().display());
        }
    }

    Ok(())
}

// --- CLI Specific Helper Functions ---

fn header_color(service: &AppService) -> Color {
    parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green)
}

fn format_weight(weight: f64) -> String {
    if weight == 0.0 {
        "-".to_string()
    } else {
        format!("{weight:.1}")
    }
}

/// Prints one workout as a date header plus a table of its sets, the same
/// shape as a history card.
fn print_workout_table(workout: &Workout, sets: &[ExerciseSet], header_color: Color) {
    println!(
        "Workout ID {} ({})",
        workout.id,
        workout.date.format("%Y-%m-%d")
    );
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Weight").fg(header_color),
        ]);
    for set in sets {
        table.add_row(vec![
            Cell::new(&set.exercise),
            Cell::new(set.sets.to_string()),
            Cell::new(set.reps.to_string()),
            Cell::new(format_weight(set.weight)),
        ]);
    }
    println!("{table}");
    if let Some(note) = workout.note.as_deref().filter(|n| !n.is_empty()) {
        println!("Note: {note}");
    }
    println!();
}

fn print_draft(draft: &WorkoutDraft, header_color: Color) {
    if draft.is_editing() {
        println!(
            "Editing workout ID {} ({})",
            draft.workout_id.unwrap_or_default(),
            draft
                .date
                .map_or_else(|| "no date".to_string(), |d| d.to_string())
        );
    } else {
        println!(
            "New workout ({})",
            draft
                .date
                .map_or_else(|| "today".to_string(), |d| d.to_string())
        );
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Weight").fg(header_color),
        ]);
    for (index, row) in draft.rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index.to_string()),
            Cell::new(&row.exercise),
            Cell::new(&row.sets),
            Cell::new(&row.reps),
            Cell::new(&row.weight),
        ]);
    }
    println!("{table}");
    if let Some(note) = draft.note.as_deref() {
        println!("Note: {note}");
    }
    if draft.is_editing() && !draft.has_changes() {
        println!("(no unsaved changes)");
    }
}

fn print_settings(settings: &Settings) {
    println!("useEnglishNames: {}", settings.use_english_names);
    println!("defaultSets:     {}", settings.default_sets);
    println!("defaultReps:     {}", settings.default_reps);
    println!(
        "defaultWeight:   {}",
        settings
            .default_weight
            .map_or_else(|| "(empty)".to_string(), |w| w.to_string())
    );
}

fn print_history_csv(history: &WorkoutHistory) -> Result<()> {
    let mut writer = csv::Writer::from_writer(stdout());
    writer.write_record([
        "WorkoutID",
        "Date",
        "Exercise",
        "Sets",
        "Reps",
        "Weight",
        "Position",
        "Note",
    ])?;
    for workout in &history.workouts {
        let Some(sets) = history.sets_by_workout.get(&workout.id) else {
            continue;
        };
        for set in sets {
            writer.write_record(&[
                workout.id.to_string(),
                workout.date.format("%Y-%m-%d").to_string(),
                set.exercise.clone(),
                set.sets.to_string(),
                set.reps.to_string(),
                set.weight.to_string(),
                set.position.map_or_else(String::new, |p| p.to_string()),
                workout.note.clone().unwrap_or_default(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
