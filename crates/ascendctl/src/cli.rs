//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ascend CLI
#[derive(Parser, Debug)]
#[command(name = "ascendctl")]
#[command(about = "Ascend - learner progression engine", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to config file (overrides $ASCEND_CONFIG and defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output JSON where supported
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new learner
    Init {
        /// Learner id (a random UUID when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Display name
        #[arg(long)]
        name: String,

        /// Replace an existing learner
        #[arg(long)]
        force: bool,
    },

    /// Show level, XP, streak and active simulation
    Status,

    /// Record an approved task submission
    SubmitTask {
        task_id: String,
    },

    /// Record a finished lesson
    CompleteLesson {
        lesson_id: String,
    },

    /// Workplace simulations
    Sim {
        #[command(subcommand)]
        action: SimCommands,
    },

    /// Fold one day-boundary observation into the streak
    Streak {
        /// The learner was active on the new day
        #[arg(long, conflicts_with = "inactive", required_unless_present = "inactive")]
        active: bool,

        /// The learner missed the day
        #[arg(long)]
        inactive: bool,

        /// No day boundary was crossed since the last check
        #[arg(long)]
        same_day: bool,
    },

    /// Jump to a checkpoint, or list them when no id is given
    Checkpoint {
        checkpoint_id: Option<String>,
    },

    /// Show the graduation checklist
    Graduation,

    /// Show notifications, newest first
    Feed {
        /// Maximum number of items
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Oldest first
        #[arg(long)]
        oldest_first: bool,
    },

    /// Rebuild the learner from the command journal and compare with the snapshot
    Replay {
        /// Overwrite the snapshot with the replayed state
        #[arg(long)]
        write: bool,
    },
}

/// Simulation subcommands
#[derive(Subcommand, Debug)]
pub enum SimCommands {
    /// Start (or resume) a scenario
    Start { scenario_id: String },

    /// Pick an option on the current step
    Choose { option_id: String },

    /// Move to the next step
    Advance,

    /// Finish the scenario and collect XP
    Complete,

    /// Show the current step
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_sim() {
        let cli = Cli::try_parse_from(["ascendctl", "--json", "sim", "choose", "ack"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Sim {
                action: SimCommands::Choose { option_id },
            } => assert_eq!(option_id, "ack"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_streak_needs_activity_flag() {
        assert!(Cli::try_parse_from(["ascendctl", "streak"]).is_err());
        assert!(Cli::try_parse_from(["ascendctl", "streak", "--active", "--inactive"]).is_err());
        assert!(Cli::try_parse_from(["ascendctl", "streak", "--inactive"]).is_ok());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
