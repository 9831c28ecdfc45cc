//! Error types for `basecamp_redmine`.
//!
//! A single error enum covers the whole run. The first four variants are the
//! import taxonomy; any of them aborts the traversal. The rest wrap ambient
//! failures (I/O, parsing, SQLite, configuration).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Kind of source record a dangling reference was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Organization,
    Project,
    Post,
    PostComment,
    TodoList,
    TodoItem,
    TodoComment,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Project => "project",
            Self::Post => "post",
            Self::PostComment => "post-comment",
            Self::TodoList => "todo-list",
            Self::TodoItem => "todo-item",
            Self::TodoComment => "todo-comment",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// A truncation or slicing argument is unusable. Programming error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required field is missing (or unparsable) on a source node.
    #[error("Malformed record {id}: missing or invalid field '{field}'")]
    MalformedRecord { id: String, field: String },

    /// A child references a parent that was never mapped in this run.
    #[error("Dangling reference: {kind} {id} points at unmapped parent {parent_id}")]
    DanglingReference {
        kind: RecordKind,
        id: String,
        parent_id: String,
    },

    /// The entity store rejected a find or create call.
    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImportError {
    pub fn malformed(id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MalformedRecord {
            id: id.into(),
            field: field.into(),
        }
    }

    pub fn dangling(kind: RecordKind, id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::DanglingReference {
            kind,
            id: id.into(),
            parent_id: parent_id.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::MalformedRecord { .. } | Self::Xml(_) => ErrorCode::MalformedInput,
            Self::DanglingReference { .. } => ErrorCode::DanglingReference,
            Self::StoreFailure(_) | Self::Database(_) => ErrorCode::StoreFailure,
            Self::Io(_) => ErrorCode::Io,
            Self::Json(_) | Self::Yaml(_) | Self::Config(_) => ErrorCode::Config,
        }
    }
}

/// Stable machine-readable error code, also used as the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    MalformedInput,
    DanglingReference,
    StoreFailure,
    Io,
    Config,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MalformedInput => "MALFORMED_INPUT",
            Self::DanglingReference => "DANGLING_REFERENCE",
            Self::StoreFailure => "STORE_FAILURE",
            Self::Io => "IO",
            Self::Config => "CONFIG",
        }
    }

    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InvalidArgument => 2,
            Self::Config => 3,
            Self::MalformedInput => 4,
            Self::DanglingReference => 5,
            Self::StoreFailure => 6,
            Self::Io => 7,
        }
    }
}

/// Error payload printed by the CLI in `--json` mode.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&ImportError> for StructuredError {
    fn from(err: &ImportError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
