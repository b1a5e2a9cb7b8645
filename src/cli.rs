// src/cli.rs
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "A CLI tool to log workout sessions", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add an exercise row to the in-progress workout draft
    Add {
        /// Exercise name (leave out to add an empty row)
        exercise: Option<String>,
        /// Number of sets (defaults to the configured default)
        #[arg(short, long)]
        sets: Option<String>,
        /// Number of repetitions per set
        #[arg(short, long)]
        reps: Option<String>,
        /// Weight used
        #[arg(short, long)]
        weight: Option<String>,
    },
    /// Remove a draft row by its index (as shown by `show`)
    RemoveRow {
        index: usize,
    },
    /// Move a draft row to a new index
    MoveRow {
        from: usize,
        to: usize,
    },
    /// Edit one field of a draft row
    SetRow {
        index: usize,
        #[arg(short, long)]
        exercise: Option<String>,
        #[arg(short, long)]
        sets: Option<String>,
        #[arg(short, long)]
        reps: Option<String>,
        #[arg(short, long)]
        weight: Option<String>,
    },
    /// Set the draft's session date (YYYY-MM-DD)
    Date {
        date: NaiveDate,
    },
    /// Set the draft's session note
    DraftNote {
        text: String,
    },
    /// Show the current draft
    Show,
    /// Validate and save the draft (new workout, or the edit in progress)
    Save,
    /// Discard the draft without saving
    Cancel,
    /// Load a stored workout into the draft for editing
    Edit {
        /// ID of the workout to edit
        id: i64,
    },
    /// List the workout history
    List {
        /// Emit CSV to stdout instead of a table
        #[arg(long)]
        export_csv: bool,
    },
    /// Toggle the history sort order (persisted)
    Sort,
    /// Delete a workout and all of its sets
    DeleteWorkout {
        /// ID of the workout to delete
        id: i64,
    },
    /// Write the free-text notes pad
    SetNote {
        content: String,
    },
    /// Show the free-text notes pad
    ShowNote,
    /// Show the current settings
    ShowSettings,
    /// Change settings (only the given flags are updated)
    SetSettings {
        /// Show English exercise names in suggestions
        #[arg(long)]
        use_english_names: Option<bool>,
        #[arg(long)]
        default_sets: Option<i64>,
        #[arg(long)]
        default_reps: Option<i64>,
        /// Default weight for new rows; pass an empty string to clear
        #[arg(long)]
        default_weight: Option<String>,
    },
    /// Search the exercise catalog (autocomplete suggestions)
    Search {
        query: String,
    },
    /// Show the path to the database file
    DbPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

// Function to get the command structure for completion generation
pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
