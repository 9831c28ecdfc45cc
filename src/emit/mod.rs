//! Operation stream produced by an import run.
//!
//! Every find/create decision becomes one [`Operation`]. Sinks receive them in
//! order; the JSONL sink writes one JSON object per line so the stream can be
//! replayed, audited, or fed to a later stage.

use crate::error::{RecordKind, Result};
use crate::model::{IssueKey, MessageKey, NewBoard, NewIssue, NewJournal, NewMessage, NewProject, TargetId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Whether an ensure-exists step found a record or made one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Existing,
}

impl Outcome {
    #[must_use]
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Informational line for a human reviewing the run.
    Trace { message: String },
    /// A source record left out of the run, with everything under it.
    Skip {
        kind: RecordKind,
        source_id: String,
        reason: String,
    },
    EnsureProject {
        source_id: String,
        outcome: Outcome,
        target_id: TargetId,
        project: NewProject,
    },
    EnsureBoard {
        project_id: TargetId,
        outcome: Outcome,
        target_id: TargetId,
        board: NewBoard,
    },
    EnsureMessage {
        source_id: String,
        outcome: Outcome,
        target_id: TargetId,
        key: MessageKey,
        message: NewMessage,
    },
    EnsureIssue {
        source_id: String,
        outcome: Outcome,
        target_id: TargetId,
        key: IssueKey,
        issue: NewIssue,
    },
    LinkTracker { project_id: TargetId, tracker: String },
    CreateJournal {
        source_id: String,
        target_id: TargetId,
        journal: NewJournal,
    },
    DeleteProject { target_id: TargetId },
}

impl Operation {
    pub fn trace(message: impl Into<String>) -> Self {
        Self::Trace {
            message: message.into(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = |outcome: &Outcome| match outcome {
            Outcome::Created => "Saved as new",
            Outcome::Existing => "Exists as",
        };
        match self {
            Self::Trace { message } => f.write_str(message),
            Self::Skip {
                kind,
                source_id,
                reason,
            } => write!(f, "Skipping {kind} {source_id}: {reason}"),
            Self::EnsureProject {
                source_id,
                outcome,
                target_id,
                project,
            } => write!(
                f,
                "{} project #{target_id} ('{}') for source {source_id}",
                verb(outcome),
                project.name
            ),
            Self::EnsureBoard {
                project_id,
                outcome,
                target_id,
                ..
            } => write!(f, "{} board #{target_id} of project #{project_id}", verb(outcome)),
            Self::EnsureMessage {
                source_id,
                outcome,
                target_id,
                ..
            } => write!(f, "{} message #{target_id} for source {source_id}", verb(outcome)),
            Self::EnsureIssue {
                source_id,
                outcome,
                target_id,
                ..
            } => write!(f, "{} issue #{target_id} for source {source_id}", verb(outcome)),
            Self::LinkTracker {
                project_id,
                tracker,
            } => write!(f, "Linked tracker '{tracker}' to project #{project_id}"),
            Self::CreateJournal {
                source_id,
                target_id,
                journal,
            } => write!(
                f,
                "Saved journal #{target_id} on issue #{} for source {source_id}",
                journal.issue_id
            ),
            Self::DeleteProject { target_id } => write!(f, "Delete project #{target_id}"),
        }
    }
}

/// Receiver of the operation stream.
pub trait Sink {
    /// # Errors
    ///
    /// Returns an error if the operation cannot be written.
    fn emit(&mut self, op: &Operation) -> Result<()>;
}

/// Keeps every operation in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub ops: Vec<Operation>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations that wrote something new to the store.
    pub fn created(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter().filter(|op| match op {
            Operation::EnsureProject { outcome, .. }
            | Operation::EnsureBoard { outcome, .. }
            | Operation::EnsureMessage { outcome, .. }
            | Operation::EnsureIssue { outcome, .. } => outcome.is_created(),
            Operation::CreateJournal { .. } => true,
            _ => false,
        })
    }
}

impl Sink for RecordingSink {
    fn emit(&mut self, op: &Operation) -> Result<()> {
        self.ops.push(op.clone());
        Ok(())
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// # Errors
    ///
    /// Returns an error if flushing the writer fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for JsonlSink<W> {
    fn emit(&mut self, op: &Operation) -> Result<()> {
        serde_json::to_writer(&mut self.writer, op)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn emit(&mut self, _op: &Operation) -> Result<()> {
        Ok(())
    }
}

/// Parse a JSONL operation stream, skipping blank lines.
///
/// # Errors
///
/// Returns an error if a line is not a valid operation.
pub fn read_operations(text: &str) -> Result<Vec<Operation>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}
