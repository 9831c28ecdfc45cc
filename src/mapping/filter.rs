//! Include-only / exclude filtering of top-level records.

use std::collections::HashSet;

/// Decides whether a top-level record (organization or project) takes part in
/// the run. An empty include set admits everything; exclusion always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionFilter {
    include: HashSet<String>,
    exclude: HashSet<String>,
}

impl InclusionFilter {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_included(&self, id: &str) -> bool {
        (self.include.is_empty() || self.include.contains(id)) && !self.exclude.contains(id)
    }
}
