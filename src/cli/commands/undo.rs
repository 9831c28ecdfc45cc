//! Undo command implementation.

use crate::cli::UndoArgs;
use crate::emit::NullSink;
use crate::error::Result;
use crate::storage::SqliteStore;
use crate::undo::{execute_plan, parse_plan};
use std::fs;
use tracing::info;

/// Execute a saved undo plan against the `SQLite` store.
///
/// # Errors
///
/// Returns an error if the plan cannot be read or parsed, or the store fails.
pub fn execute(args: &UndoArgs, json: bool) -> Result<()> {
    let plan = parse_plan(&fs::read_to_string(&args.plan)?)?;
    info!(plan = %args.plan.display(), operations = plan.len(), "Executing undo plan");

    let mut store = SqliteStore::open(&args.db)?;
    let summary = execute_plan(&mut store, &plan, &mut NullSink)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Deleted {} project(s); {} already gone.",
            summary.deleted.len(),
            summary.missing.len()
        );
    }
    Ok(())
}
