//! Records written to (or matched in) the target issue tracker.

use crate::mapping::users::UserRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned id of a target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub i64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub identifier: String,
    pub enabled_modules: Vec<String>,
    pub trackers: Vec<String>,
    pub parent_id: Option<TargetId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBoard {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub board_id: TargetId,
    pub parent_id: Option<TargetId>,
    pub subject: String,
    pub content: String,
    pub author: UserRef,
    pub created_on: DateTime<Utc>,
}

/// Scope used to decide whether a message already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope")]
pub enum MessageKey {
    /// A top-level post on a board.
    Topic { subject: String, board_id: TargetId },
    /// A reply under a parent message, anywhere in the project's boards.
    Reply {
        subject: String,
        parent_id: TargetId,
        project_id: TargetId,
        created_on: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub project_id: TargetId,
    pub parent_id: Option<TargetId>,
    pub subject: String,
    pub description: String,
    pub status: String,
    pub tracker: String,
    pub author: UserRef,
    pub assignee: Option<UserRef>,
    pub created_on: Option<DateTime<Utc>>,
}

/// Scope used to decide whether an issue already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope")]
pub enum IssueKey {
    /// A top-level issue of a project.
    InProject { subject: String, project_id: TargetId },
    /// A sub-issue of a parent issue.
    Child { subject: String, parent_id: TargetId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournal {
    pub issue_id: TargetId,
    pub notes: String,
    pub user: UserRef,
    pub created_on: DateTime<Utc>,
}
