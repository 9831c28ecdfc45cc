//! `bc2rm` - import a project-management export into an issue tracker store.

use anyhow::Context;
use basecamp_redmine::cli::{Cli, Commands, commands};
use basecamp_redmine::error::{ImportError, StructuredError};
use basecamp_redmine::logging::init_logging;
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }

    if let Err(err) = run(&cli) {
        let code = err
            .downcast_ref::<ImportError>()
            .map_or(1, |e| e.code().exit_code());
        if cli.json {
            let payload = err.downcast_ref::<ImportError>().map_or_else(
                || serde_json::json!({ "code": "INTERNAL", "message": format!("{err:#}") }),
                |e| serde_json::json!(StructuredError::from(e)),
            );
            eprintln!("{payload}");
        } else {
            eprintln!("Error: {err:#}");
        }
        process::exit(code);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Import(args) => commands::import::execute(args, cli.json)
            .with_context(|| format!("importing {}", args.export.display())),
        Commands::Undo(args) => commands::undo::execute(args, cli.json)
            .with_context(|| format!("undoing {}", args.plan.display())),
    }
}
