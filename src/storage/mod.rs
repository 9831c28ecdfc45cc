//! Entity store layer for `basecamp_redmine`.
//!
//! The importer only talks to the [`EntityStore`] trait: find-by-scope,
//! create, and project deletion. Two backends implement it:
//!
//! - [`memory`] - In-process vectors, used for dry runs and tests
//! - [`sqlite`] - `SQLite` tables with cascading foreign keys
//! - [`schema`] - `SQLite` schema definitions

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{IssueKey, MessageKey, NewBoard, NewIssue, NewJournal, NewMessage, NewProject, TargetId};

/// Destination data model as seen by the importer.
///
/// Finds return `Ok(None)` when nothing matches; an `Err` is always a store
/// failure and aborts the run. The store assumes a single writer for the
/// duration of a run.
pub trait EntityStore {
    /// Project whose name equals `name` exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_project(&self, name: &str) -> Result<Option<TargetId>>;

    /// # Errors
    ///
    /// Returns an error if the project cannot be persisted.
    fn create_project(&mut self, project: &NewProject) -> Result<TargetId>;

    /// First board of a project, if it has any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_board(&self, project_id: TargetId) -> Result<Option<TargetId>>;

    /// # Errors
    ///
    /// Returns an error if the board cannot be persisted.
    fn create_board(&mut self, project_id: TargetId, board: &NewBoard) -> Result<TargetId>;

    /// Link a tracker to a project. Returns `false` when it was already linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be persisted.
    fn add_tracker(&mut self, project_id: TargetId, tracker: &str) -> Result<bool>;

    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_message(&self, key: &MessageKey) -> Result<Option<TargetId>>;

    /// # Errors
    ///
    /// Returns an error if the message cannot be persisted.
    fn create_message(&mut self, message: &NewMessage) -> Result<TargetId>;

    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_issue(&self, key: &IssueKey) -> Result<Option<TargetId>>;

    /// # Errors
    ///
    /// Returns an error if the issue cannot be persisted.
    fn create_issue(&mut self, issue: &NewIssue) -> Result<TargetId>;

    /// # Errors
    ///
    /// Returns an error if the journal cannot be persisted.
    fn create_journal(&mut self, journal: &NewJournal) -> Result<TargetId>;

    /// Delete a project together with its boards, messages, issues and
    /// journals. Returns `false` if no such project exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    fn delete_project(&mut self, id: TargetId) -> Result<bool>;

    /// Remember the fingerprint of the export a finished run consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot record it.
    fn record_import(&mut self, _source_hash: &str) -> Result<()> {
        Ok(())
    }
}
