//! Data types for both sides of the import.
//!
//! Source records are read-only views of the export, keyed by the string ids
//! the export assigns. Target records live in [`target`] and are keyed by the
//! numeric ids the entity store hands out.

pub mod target;

pub use target::{
    IssueKey, MessageKey, NewBoard, NewIssue, NewJournal, NewMessage, NewProject, TargetId,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Which organizational element an [`Organization`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationKind {
    Firm,
    Client,
}

impl fmt::Display for OrganizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firm => f.write_str("firm"),
            Self::Client => f.write_str("client"),
        }
    }
}

/// The account owner (`firm`) or one of its `clients`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub kind: OrganizationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl ProjectStatus {
    /// Anything other than `archived` (`active`, `on_hold`, ...) is imported.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("archived") {
            Self::Archived
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub company_id: Option<String>,
}

impl Project {
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.status == ProjectStatus::Archived
    }
}

/// A message-board post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub body: String,
    pub author_id: Option<String>,
    pub author_name: String,
    pub posted_on: DateTime<Utc>,
}

/// A comment attached either to a post or to a todo item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub commentable_id: String,
    pub body: String,
    pub author_id: Option<String>,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoList {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub complete: bool,
    pub creator_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub todo_list_id: String,
    pub content: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub responsible_party_id: Option<String>,
    pub creator_id: Option<String>,
    pub creator_name: String,
    /// `None` when the export omits the counter.
    pub comments_count: Option<u32>,
}

impl TodoItem {
    /// Items whose counter says zero are never searched for comments.
    #[must_use]
    pub fn may_have_comments(&self) -> bool {
        self.comments_count != Some(0)
    }
}
