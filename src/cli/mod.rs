//! CLI argument definitions for `bc2rm`.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Convert a project-management XML export into issue-tracker records.
///
/// Every record is found or created, so re-running the same export is safe.
#[derive(Parser, Debug)]
#[command(name = "bc2rm", author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv adds SQL, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import an export file into the target store
    Import(ImportArgs),

    /// Execute a saved undo plan
    Undo(UndoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Export file (XML)
    pub export: PathBuf,

    /// `SQLite` target store
    #[arg(long, value_name = "PATH", env = "BC2RM_DB", required_unless_present = "dry_run")]
    pub db: Option<PathBuf>,

    /// Run against an empty in-memory store; nothing is persisted
    #[arg(long, conflicts_with = "db")]
    pub dry_run: bool,

    /// Write the operation stream as JSONL (`-` for stdout)
    #[arg(long, value_name = "PATH")]
    pub ops: Option<PathBuf>,

    /// Write the undo plan (JSONL) after a successful run
    #[arg(long, value_name = "PATH")]
    pub undo_plan: Option<PathBuf>,

    /// Config file (defaults to ./bc2rm.yaml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Delete the projects created so far if the run fails
    #[arg(long)]
    pub rollback: bool,

    /// Import the firm and its clients as parent projects
    #[arg(long)]
    pub organizations: bool,

    /// Existing target project used as parent of imported projects
    #[arg(long, value_name = "ID")]
    pub parent_project: Option<i64>,
}

impl ImportArgs {
    /// Whether the operation stream goes to stdout.
    #[must_use]
    pub fn ops_to_stdout(&self) -> bool {
        self.ops.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }
}

#[derive(Args, Debug, Clone)]
pub struct UndoArgs {
    /// Undo plan written by `import --undo-plan`
    pub plan: PathBuf,

    /// `SQLite` target store
    #[arg(long, value_name = "PATH", env = "BC2RM_DB")]
    pub db: PathBuf,
}
