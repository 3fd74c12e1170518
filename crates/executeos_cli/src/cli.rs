//! Command-line definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ExecuteOS: brain dump, triage, schedule, execute.
#[derive(Parser)]
#[command(
    name = "executeos",
    version,
    about = "Plan a day from a brain dump, one step at a time",
    after_help = "Environment: EXECUTEOS_DB_PATH, EXECUTEOS_LOG_LEVEL, EXECUTEOS_LOG_DIR"
)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage strategic priorities
    #[command(subcommand)]
    Priorities(PriorityCommand),

    /// Capture a brain dump, one item per line (reads stdin when TEXT is omitted)
    Dump { text: Option<String> },

    /// List items waiting for triage
    Inbox,

    /// File an inbox item under a priority or discard it
    Triage(TriageArgs),

    /// Apply assistant suggestions from a JSON response file
    Assist {
        #[arg(long, value_name = "FILE")]
        response: PathBuf,
    },

    /// Set the duration of a commitment
    Duration {
        commitment: String,
        /// Minutes, e.g. 15, 30, 90
        minutes: String,
    },

    /// List commitments with durations and check they are ready to plan
    Durations,

    /// Place a commitment on the grid
    Schedule {
        commitment: String,
        #[command(flatten)]
        slot: SlotArgs,
    },

    /// Move a block, keeping its duration
    Move {
        block: String,
        #[command(flatten)]
        slot: SlotArgs,
    },

    /// Remove a block from the schedule
    Unschedule {
        block: String,
        /// Confirm removal
        #[arg(long)]
        yes: bool,
    },

    /// Show scheduled blocks
    Agenda {
        #[arg(long, value_enum, default_value_t = ViewArg::Week)]
        view: ViewArg,
        /// Anchor date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show cycle statistics and integrity problems
    Review,

    /// Archive the cycle and clear the working buffers
    Finalize,

    /// List archived sessions
    Sessions,

    /// Show the current and next block
    Now,

    /// Mark a block completed
    Complete { block: String },
}

#[derive(Subcommand)]
pub enum PriorityCommand {
    /// List priorities, active focus first
    List,
    /// Add a priority (pinned)
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Rename or redescribe a priority
    Edit {
        priority: String,
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    Remove { priority: String },
    /// Move into active focus
    Pin { priority: String },
    /// Move to backlog
    Unpin { priority: String },
    /// Move to a zero-based position
    Move { priority: String, index: usize },
    Up { priority: String },
    Down { priority: String },
    /// Add the built-in starter priorities
    Seed,
}

#[derive(Args)]
pub struct TriageArgs {
    pub item: String,
    #[arg(long, conflicts_with_all = ["discard", "new_priority"])]
    pub priority: Option<String>,
    /// Create a priority with this name and file the item under it
    #[arg(long, conflicts_with = "discard")]
    pub new_priority: Option<String>,
    #[arg(long)]
    pub discard: bool,
}

#[derive(Args)]
pub struct SlotArgs {
    /// YYYY-MM-DD
    #[arg(long)]
    pub date: String,
    /// HH:MM local time
    #[arg(long)]
    pub time: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ViewArg {
    Day,
    Week,
    Month,
}
