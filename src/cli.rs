//! Command-line interface argument parsing for streak-tracker.
//!
//! - `streak pin set 1234`
//! - `streak --pin 1234 habit add "Read"`
//! - `streak --pin 1234 mark "Read" green --date 2024-01-03`
//! - `streak --pin 1234 export streaks.csv`

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::data::MarkState;

/// File name of the database inside the data directory
const DB_FILE_NAME: &str = "streaks.db";

/// A PIN-protected habit streak tracker.
///
/// Mark days green (done) or red (skipped) per habit and track current and
/// longest streaks.
#[derive(Parser, Debug)]
#[command(name = "streak")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the streak database file
    /// Defaults to $STREAK_DIR/streaks.db, then the platform data directory
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// 4-digit PIN unlocking habit commands
    #[arg(long, global = true, env = "STREAK_PIN", hide_env_values = true)]
    pub pin: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set, change or check the PIN
    Pin {
        #[command(subcommand)]
        action: PinCommand,
    },

    /// Add, delete, list or reset habits
    Habit {
        #[command(subcommand)]
        action: HabitCommand,
    },

    /// Mark a day for a habit
    Mark {
        /// Habit name
        name: String,

        /// green (done), red (skipped) or none (clear the mark)
        #[arg(value_enum)]
        state: MarkArg,

        /// Day to mark as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show the day marks and streaks of one habit
    Show {
        /// Habit name
        name: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show current and longest streak for every habit
    Stats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write every day mark to a CSV file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Merge day marks from a CSV file
    Import {
        /// Source file with a "Streak Name,Date,Status" header
        file: PathBuf,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

/// Day state accepted by `mark`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkArg {
    Green,
    Red,
    None,
}

impl From<MarkArg> for MarkState {
    fn from(arg: MarkArg) -> Self {
        match arg {
            MarkArg::Green => MarkState::Green,
            MarkArg::Red => MarkState::Red,
            MarkArg::None => MarkState::None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PinCommand {
    /// Set the PIN for the first time
    Set {
        #[arg(value_name = "PIN")]
        code: String,
    },
    /// Replace the PIN after confirming the current one
    Change { old: String, new: String },
    /// Check a PIN
    Verify {
        #[arg(value_name = "PIN")]
        code: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum HabitCommand {
    /// Create a new habit
    Add { name: String },
    /// Delete a habit and all of its marks
    Delete { name: String },
    /// List habit names
    List,
    /// Clear every mark of a habit
    Reset { name: String },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub pin: Option<String>,
}

impl AppConfig {
    /// Create AppConfig from the global CLI options
    pub fn from_args(db_path: Option<String>, pin: Option<String>) -> Self {
        let db_path = db_path.map(PathBuf::from).unwrap_or_else(|| {
            // Check STREAK_DIR environment variable first
            if let Ok(dir) = std::env::var("STREAK_DIR") {
                PathBuf::from(dir).join(DB_FILE_NAME)
            } else {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("streak-tracker")
                    .join(DB_FILE_NAME)
            }
        });

        AppConfig { db_path, pin }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_db_path() {
        let config = AppConfig::from_args(Some("/tmp/habits.db".to_string()), None);
        assert_eq!(config.db_path, PathBuf::from("/tmp/habits.db"));
        assert!(config.pin.is_none());
    }

    #[test]
    fn test_default_db_file_name() {
        let config = AppConfig::from_args(None, Some("1234".to_string()));
        assert_eq!(config.db_path.file_name().unwrap(), DB_FILE_NAME);
        assert_eq!(config.pin.as_deref(), Some("1234"));
    }

    #[test]
    fn test_parse_mark_command() {
        let cli = Cli::try_parse_from([
            "streak", "--pin", "1234", "mark", "Read", "none", "--date", "2024-01-03",
        ])
        .unwrap();
        assert_eq!(cli.pin.as_deref(), Some("1234"));
        match cli.command {
            Commands::Mark { name, state, date } => {
                assert_eq!(name, "Read");
                assert_eq!(state, MarkArg::None);
                assert_eq!(MarkState::from(state), MarkState::None);
                assert_eq!(date.as_deref(), Some("2024-01-03"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_mark_state() {
        assert!(Cli::try_parse_from(["streak", "mark", "Read", "blue"]).is_err());
    }

    #[test]
    fn test_parse_pin_set() {
        let cli = Cli::try_parse_from(["streak", "pin", "set", "4321"]).unwrap();
        match cli.command {
            Commands::Pin {
                action: PinCommand::Set { code },
            } => assert_eq!(code, "4321"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
