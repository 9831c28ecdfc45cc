//! `basecamp_redmine` - turn a project-management XML export into idempotent
//! find-or-create operations against an issue-tracker data model.
//!
//! This crate provides the core of the `bc2rm` CLI tool.
//!
//! # Architecture
//!
//! Data flows one way: [`source`] → [`import`] (hierarchy walk) →
//! [`mapping`] (find-or-create) → [`emit`] sinks, with [`undo`] observing the
//! same stream to build a reversal plan.
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Layered configuration (defaults, YAML, environment, CLI)
//! - [`emit`] - Operation stream and sinks
//! - [`error`] - Error types and exit codes
//! - [`import`] - Hierarchy walker and run orchestration with rollback
//! - [`logging`] - tracing setup
//! - [`mapping`] - Entity mapper, user mapping, inclusion filter
//! - [`model`] - Source records and target records
//! - [`source`] - XML export reader
//! - [`storage`] - Entity store trait with in-memory and `SQLite` backends
//! - [`undo`] - Undo planner
//! - [`util`] - Text normalization, hashing, timestamps

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod import;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod source;
pub mod storage;
pub mod undo;
pub mod util;

pub use error::{ErrorCode, ImportError, Result, StructuredError};
pub use import::{ImportReport, import_file, run_import};
