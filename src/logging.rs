//! Tracing setup for the `bc2rm` binary and the test suite.
//!
//! Human-readable events go to stderr. `--log-file` adds a JSON layer so a
//! run can be audited afterwards next to its operation stream.

use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Target prefix of every event this crate emits.
const CRATE_TARGET: &str = "basecamp_redmine";

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter follows `-v`/`--quiet`.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log file cannot be created,
/// or a subscriber is already installed.
pub fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbosity, quiet)))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0)
        .with_ansi(std::io::stderr().is_terminal());

    let json_layer = log_file
        .map(|path| {
            File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))
                .map(|file| {
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .json()
                })
        })
        .transpose()?;

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(json_layer),
    )?;

    Ok(())
}

fn default_filter(verbosity: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }

    match verbosity {
        0 => format!("{CRATE_TARGET}=info"),
        1 => format!("{CRATE_TARGET}=debug"),
        2 => format!("{CRATE_TARGET}=debug,rusqlite=debug"),
        _ => format!("{CRATE_TARGET}=trace"),
    }
}

/// Initialize logging for tests with the test writer.
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(format!("{CRATE_TARGET}=debug"))
            .with_test_writer()
            .try_init()
            .ok();
    });
}
