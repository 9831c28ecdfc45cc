//! Import command implementation.

use crate::cli::ImportArgs;
use crate::config::{self, CliOverrides};
use crate::emit::JsonlSink;
use crate::error::Result;
use crate::import::{ImportReport, import_file};
use crate::storage::{MemoryStore, SqliteStore};
use crate::undo::render_plan;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store cannot be opened,
/// the run fails, or an output file cannot be written.
pub fn execute(args: &ImportArgs, json: bool) -> Result<()> {
    let overrides = CliOverrides {
        rollback: args.rollback.then_some(true),
        import_organizations: args.organizations.then_some(true),
        parent_project_id: args.parent_project,
    };
    let config = config::load_import_config(args.config.as_deref(), &overrides)?;
    debug!(?config, "Resolved configuration");

    let mut sink = JsonlSink::new(ops_writer(args.ops.as_deref())?);
    let report = match args.db.as_deref() {
        Some(db) if !args.dry_run => {
            info!(db = %db.display(), "Opening target store");
            let mut store = SqliteStore::open(db)?;
            import_file(&mut store, &config, &args.export, &mut sink)?
        }
        _ => {
            info!("Dry run against an empty in-memory store");
            let mut store = MemoryStore::new();
            import_file(&mut store, &config, &args.export, &mut sink)?
        }
    };
    sink.flush()?;

    if let Some(path) = &args.undo_plan {
        fs::write(path, render_plan(&report.undo_plan())?)?;
        info!(path = %path.display(), projects = report.created_projects.len(), "Wrote undo plan");
    }

    print_report(&report, json, args.ops_to_stdout())
}

fn ops_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if p.as_os_str() == "-" => Box::new(io::stdout().lock()),
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(io::sink()),
    })
}

/// The report goes to stderr when stdout carries the operation stream.
fn print_report(report: &ImportReport, json: bool, stdout_taken: bool) -> Result<()> {
    let text = if json {
        serde_json::to_string_pretty(report)?
    } else {
        report.to_string()
    };
    if stdout_taken {
        eprintln!("{text}");
    } else {
        println!("{text}");
    }
    Ok(())
}
