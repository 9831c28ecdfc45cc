//! `SQLite` entity store implementation.

use super::EntityStore;
use crate::error::{ImportError, Result};
use crate::mapping::users::UserRef;
use crate::model::{IssueKey, MessageKey, NewBoard, NewIssue, NewJournal, NewMessage, NewProject, TargetId};
use crate::storage::schema::apply_schema;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::Path;

const METADATA_LAST_IMPORT_TIME: &str = "last_import_time";
const METADATA_SOURCE_HASH: &str = "source_content_hash";

/// SQLite-based target store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

/// Row counts per table, used by tests and the run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub projects: usize,
    pub boards: usize,
    pub messages: usize,
    pub issues: usize,
    pub journals: usize,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Run `f` inside an immediate transaction, committing on success.
    fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let result = f(&tx).map_err(|err| match err {
            ImportError::Database(db) => ImportError::StoreFailure(format!("{op}: {db}")),
            other => other,
        })?;
        tx.commit()?;
        Ok(result)
    }

    /// Count rows in every entity table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };
        Ok(TableCounts {
            projects: count("projects")?,
            boards: count("boards")?,
            messages: count("messages")?,
            issues: count("issues")?,
            journals: count("journals")?,
        })
    }

    /// Trackers linked to a project, in name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn trackers(&self, project_id: TargetId) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT tracker FROM project_trackers WHERE project_id = ? ORDER BY tracker",
        )?;
        let rows = stmt.query_map([project_id.0], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<String>, _>>()?)
    }

    /// Parent link of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project does not exist or the query fails.
    pub fn project_parent(&self, project_id: TargetId) -> Result<Option<TargetId>> {
        let parent: Option<i64> = self.conn.query_row(
            "SELECT parent_id FROM projects WHERE id = ?",
            [project_id.0],
            |row| row.get(0),
        )?;
        Ok(parent.map(TargetId))
    }

    /// Author recorded on a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message does not exist or the query fails.
    pub fn message_author(&self, message_id: TargetId) -> Result<Option<UserRef>> {
        let author: String = self.conn.query_row(
            "SELECT author FROM messages WHERE id = ?",
            [message_id.0],
            |row| row.get(0),
        )?;
        Ok(UserRef::from_key(&author))
    }

    /// Fetch a metadata value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a metadata value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn set_metadata(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn lookup(&self, op: &str, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Option<TargetId>> {
        self.conn
            .query_row(sql, params, |row| row.get::<_, i64>(0))
            .optional()
            .map(|id| id.map(TargetId))
            .map_err(|err| ImportError::StoreFailure(format!("{op}: {err}")))
    }
}

impl EntityStore for SqliteStore {
    fn find_project(&self, name: &str) -> Result<Option<TargetId>> {
        self.lookup(
            "find_project",
            "SELECT id FROM projects WHERE name = ? ORDER BY id LIMIT 1",
            &[&name],
        )
    }

    fn create_project(&mut self, project: &NewProject) -> Result<TargetId> {
        self.mutate("create_project", |tx| {
            tx.execute(
                "INSERT INTO projects (name, description, identifier, enabled_modules, parent_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    project.name,
                    project.description,
                    project.identifier,
                    project.enabled_modules.join(","),
                    project.parent_id.map(|p| p.0),
                    Utc::now().to_rfc3339(),
                ],
            )?;
            let id = tx.last_insert_rowid();
            for tracker in &project.trackers {
                tx.execute(
                    "INSERT OR IGNORE INTO project_trackers (project_id, tracker) VALUES (?, ?)",
                    params![id, tracker],
                )?;
            }
            Ok(TargetId(id))
        })
    }

    fn find_board(&self, project_id: TargetId) -> Result<Option<TargetId>> {
        self.lookup(
            "find_board",
            "SELECT id FROM boards WHERE project_id = ? ORDER BY id LIMIT 1",
            &[&project_id.0],
        )
    }

    fn create_board(&mut self, project_id: TargetId, board: &NewBoard) -> Result<TargetId> {
        self.mutate("create_board", |tx| {
            tx.execute(
                "INSERT INTO boards (project_id, name, description) VALUES (?, ?, ?)",
                params![project_id.0, board.name, board.description],
            )?;
            Ok(TargetId(tx.last_insert_rowid()))
        })
    }

    fn add_tracker(&mut self, project_id: TargetId, tracker: &str) -> Result<bool> {
        self.mutate("add_tracker", |tx| {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO project_trackers (project_id, tracker) VALUES (?, ?)",
                params![project_id.0, tracker],
            )?;
            Ok(inserted > 0)
        })
    }

    fn find_message(&self, key: &MessageKey) -> Result<Option<TargetId>> {
        match key {
            MessageKey::Topic { subject, board_id } => self.lookup(
                "find_message",
                "SELECT id FROM messages
                 WHERE board_id = ? AND subject = ? AND parent_id IS NULL
                 ORDER BY id LIMIT 1",
                &[&board_id.0, subject],
            ),
            MessageKey::Reply {
                subject,
                parent_id,
                project_id,
                created_on,
            } => self.lookup(
                "find_message",
                "SELECT m.id FROM messages m JOIN boards b ON b.id = m.board_id
                 WHERE m.parent_id = ? AND m.subject = ? AND m.created_on = ? AND b.project_id = ?
                 ORDER BY m.id LIMIT 1",
                &[&parent_id.0, subject, &created_on.to_rfc3339(), &project_id.0],
            ),
        }
    }

    fn create_message(&mut self, message: &NewMessage) -> Result<TargetId> {
        self.mutate("create_message", |tx| {
            tx.execute(
                "INSERT INTO messages (board_id, parent_id, subject, content, author, created_on)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    message.board_id.0,
                    message.parent_id.map(|p| p.0),
                    message.subject,
                    message.content,
                    message.author.as_key(),
                    message.created_on.to_rfc3339(),
                ],
            )?;
            Ok(TargetId(tx.last_insert_rowid()))
        })
    }

    fn find_issue(&self, key: &IssueKey) -> Result<Option<TargetId>> {
        match key {
            IssueKey::InProject {
                subject,
                project_id,
            } => self.lookup(
                "find_issue",
                "SELECT id FROM issues WHERE project_id = ? AND subject = ? ORDER BY id LIMIT 1",
                &[&project_id.0, subject],
            ),
            IssueKey::Child { subject, parent_id } => self.lookup(
                "find_issue",
                "SELECT id FROM issues WHERE parent_id = ? AND subject = ? ORDER BY id LIMIT 1",
                &[&parent_id.0, subject],
            ),
        }
    }

    fn create_issue(&mut self, issue: &NewIssue) -> Result<TargetId> {
        self.mutate("create_issue", |tx| {
            tx.execute(
                "INSERT INTO issues (
                    project_id, parent_id, subject, description, status, tracker,
                    author, assigned_to, created_on
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    issue.project_id.0,
                    issue.parent_id.map(|p| p.0),
                    issue.subject,
                    issue.description,
                    issue.status,
                    issue.tracker,
                    issue.author.as_key(),
                    issue.assignee.map(|a| a.as_key()),
                    issue.created_on.map(|t| t.to_rfc3339()),
                ],
            )?;
            Ok(TargetId(tx.last_insert_rowid()))
        })
    }

    fn create_journal(&mut self, journal: &NewJournal) -> Result<TargetId> {
        self.mutate("create_journal", |tx| {
            tx.execute(
                "INSERT INTO journals (issue_id, notes, author, created_on) VALUES (?, ?, ?, ?)",
                params![
                    journal.issue_id.0,
                    journal.notes,
                    journal.user.as_key(),
                    journal.created_on.to_rfc3339(),
                ],
            )?;
            Ok(TargetId(tx.last_insert_rowid()))
        })
    }

    fn delete_project(&mut self, id: TargetId) -> Result<bool> {
        self.mutate("delete_project", |tx| {
            let deleted = tx.execute("DELETE FROM projects WHERE id = ?", [id.0])?;
            Ok(deleted > 0)
        })
    }

    fn record_import(&mut self, source_hash: &str) -> Result<()> {
        self.set_metadata(METADATA_LAST_IMPORT_TIME, &Utc::now().to_rfc3339())?;
        self.set_metadata(METADATA_SOURCE_HASH, source_hash)
    }
}
