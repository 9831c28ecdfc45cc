//! Source user id → target user id mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Author or assignee as written into a target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum UserRef {
    /// A mapped target user id.
    User(i64),
    /// The target system's anonymous author.
    Anonymous,
}

/// The fallback used whenever a source user has no mapping.
pub const DEFAULT_AUTHOR: UserRef = UserRef::Anonymous;

impl UserRef {
    /// Storage form: the numeric id, or `anonymous`.
    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            Self::User(id) => id.to_string(),
            Self::Anonymous => "anonymous".to_string(),
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "anonymous" => Some(Self::Anonymous),
            other => other.parse().ok().map(Self::User),
        }
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user #{id}"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Static allow-list of source user ids with a known target account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMap {
    table: HashMap<String, i64>,
}

impl UserMap {
    #[must_use]
    pub fn new(table: HashMap<String, i64>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Resolve a source user id. Absent, blank, or unmapped ids fall back to
    /// [`DEFAULT_AUTHOR`].
    #[must_use]
    pub fn map_user(&self, source_id: Option<&str>) -> UserRef {
        source_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .and_then(|id| self.table.get(id))
            .map_or(DEFAULT_AUTHOR, |&id| UserRef::User(id))
    }
}

impl FromIterator<(String, i64)> for UserMap {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> UserMap {
        [("11357920".to_string(), 5)].into_iter().collect()
    }

    #[test]
    fn mapped_user_resolves() {
        assert_eq!(users().map_user(Some("11357920")), UserRef::User(5));
        assert_eq!(users().map_user(Some(" 11357920 ")), UserRef::User(5));
    }

    #[test]
    fn unmapped_blank_or_missing_falls_back() {
        let users = users();
        assert_eq!(users.map_user(Some("42")), DEFAULT_AUTHOR);
        assert_eq!(users.map_user(Some("")), DEFAULT_AUTHOR);
        assert_eq!(users.map_user(None), DEFAULT_AUTHOR);
        assert_eq!(UserMap::default().map_user(Some("11357920")), DEFAULT_AUTHOR);
    }
}
