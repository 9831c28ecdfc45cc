//! Reversal plan for an import run.
//!
//! Only projects the run created are tracked. Deleting a project cascades to
//! its boards, messages, issues and journals, so one delete per created
//! project is enough to restore the store.

use crate::emit::{Operation, Outcome, Sink, read_operations};
use crate::error::{ImportError, Result};
use crate::model::TargetId;
use crate::storage::EntityStore;
use serde::Serialize;

/// Watches the operation stream and remembers created projects in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoPlanner {
    created: Vec<TargetId>,
}

impl UndoPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, op: &Operation) {
        if let Operation::EnsureProject {
            outcome: Outcome::Created,
            target_id,
            ..
        } = op
        {
            if !self.created.contains(target_id) {
                self.created.push(*target_id);
            }
        }
    }

    #[must_use]
    pub fn created_projects(&self) -> &[TargetId] {
        &self.created
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// One delete per created project, in creation order.
    #[must_use]
    pub fn plan(&self) -> Vec<Operation> {
        self.created
            .iter()
            .map(|&target_id| Operation::DeleteProject { target_id })
            .collect()
    }
}

/// Result of executing a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UndoSummary {
    pub deleted: Vec<TargetId>,
    /// Ids that were already gone.
    pub missing: Vec<TargetId>,
}

/// Run each delete of `plan` against `store`, emitting it first.
///
/// # Errors
///
/// Returns an error if the plan holds anything other than project deletions,
/// or the store fails.
pub fn execute_plan<S: EntityStore + ?Sized>(
    store: &mut S,
    plan: &[Operation],
    sink: &mut dyn Sink,
) -> Result<UndoSummary> {
    let mut summary = UndoSummary::default();
    for op in plan {
        match op {
            Operation::DeleteProject { target_id } => {
                sink.emit(op)?;
                if store.delete_project(*target_id)? {
                    tracing::debug!(target_id = %target_id, "Deleted project");
                    summary.deleted.push(*target_id);
                } else {
                    tracing::warn!(target_id = %target_id, "Project already gone");
                    summary.missing.push(*target_id);
                }
            }
            Operation::Trace { .. } => {}
            other => {
                return Err(ImportError::InvalidArgument(format!(
                    "undo plan may only delete projects, found: {other}"
                )));
            }
        }
    }
    Ok(summary)
}

/// Serialize a plan as JSONL.
///
/// # Errors
///
/// Returns an error if an operation cannot be serialized.
pub fn render_plan(plan: &[Operation]) -> Result<String> {
    let mut out = String::new();
    for op in plan {
        out.push_str(&serde_json::to_string(op)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse a JSONL plan written by [`render_plan`].
///
/// # Errors
///
/// Returns an error if a line is not a valid operation.
pub fn parse_plan(text: &str) -> Result<Vec<Operation>> {
    read_operations(text)
}
