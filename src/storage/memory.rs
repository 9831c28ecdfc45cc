//! In-memory entity store.
//!
//! Records are kept in insertion order with per-table id sequences, mirroring
//! what the `SQLite` backend would assign on an empty database. Lookups are
//! linear scans.

use super::EntityStore;
use crate::error::Result;
use crate::model::{IssueKey, MessageKey, NewBoard, NewIssue, NewJournal, NewMessage, NewProject, TargetId};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProject {
    pub id: TargetId,
    pub record: NewProject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBoard {
    pub id: TargetId,
    pub project_id: TargetId,
    pub record: NewBoard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: TargetId,
    pub record: NewMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIssue {
    pub id: TargetId,
    pub record: NewIssue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredJournal {
    pub id: TargetId,
    pub record: NewJournal,
}

#[derive(Debug, Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> TargetId {
        self.0 += 1;
        TargetId(self.0)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: Vec<StoredProject>,
    boards: Vec<StoredBoard>,
    messages: Vec<StoredMessage>,
    issues: Vec<StoredIssue>,
    journals: Vec<StoredJournal>,
    project_seq: Sequence,
    board_seq: Sequence,
    message_seq: Sequence,
    issue_seq: Sequence,
    journal_seq: Sequence,
    last_import_hash: Option<String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn projects(&self) -> &[StoredProject] {
        &self.projects
    }

    #[must_use]
    pub fn boards(&self) -> &[StoredBoard] {
        &self.boards
    }

    #[must_use]
    pub fn messages(&self) -> &[StoredMessage] {
        &self.messages
    }

    #[must_use]
    pub fn issues(&self) -> &[StoredIssue] {
        &self.issues
    }

    #[must_use]
    pub fn journals(&self) -> &[StoredJournal] {
        &self.journals
    }

    #[must_use]
    pub fn project(&self, id: TargetId) -> Option<&StoredProject> {
        self.projects.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn last_import_hash(&self) -> Option<&str> {
        self.last_import_hash.as_deref()
    }

    /// Remove every board of a project, leaving the project in place.
    pub fn drop_boards(&mut self, project_id: TargetId) {
        let doomed: HashSet<TargetId> = self
            .boards
            .iter()
            .filter(|b| b.project_id == project_id)
            .map(|b| b.id)
            .collect();
        self.remove_boards(&doomed);
    }

    fn board_project(&self, board_id: TargetId) -> Option<TargetId> {
        self.boards
            .iter()
            .find(|b| b.id == board_id)
            .map(|b| b.project_id)
    }

    fn remove_boards(&mut self, doomed: &HashSet<TargetId>) {
        self.boards.retain(|b| !doomed.contains(&b.id));

        // Replies go with their topic.
        let mut dead: HashSet<TargetId> = self
            .messages
            .iter()
            .filter(|m| doomed.contains(&m.record.board_id))
            .map(|m| m.id)
            .collect();
        loop {
            let before = dead.len();
            for message in &self.messages {
                if message.record.parent_id.is_some_and(|p| dead.contains(&p)) {
                    dead.insert(message.id);
                }
            }
            if dead.len() == before {
                break;
            }
        }
        self.messages.retain(|m| !dead.contains(&m.id));
    }

    fn remove_issues(&mut self, roots: HashSet<TargetId>) {
        let mut dead = roots;
        loop {
            let before = dead.len();
            for issue in &self.issues {
                if issue.record.parent_id.is_some_and(|p| dead.contains(&p)) {
                    dead.insert(issue.id);
                }
            }
            if dead.len() == before {
                break;
            }
        }
        self.issues.retain(|i| !dead.contains(&i.id));
        self.journals.retain(|j| !dead.contains(&j.record.issue_id));
    }
}

impl EntityStore for MemoryStore {
    fn find_project(&self, name: &str) -> Result<Option<TargetId>> {
        Ok(self
            .projects
            .iter()
            .find(|p| p.record.name == name)
            .map(|p| p.id))
    }

    fn create_project(&mut self, project: &NewProject) -> Result<TargetId> {
        let id = self.project_seq.next();
        self.projects.push(StoredProject {
            id,
            record: project.clone(),
        });
        Ok(id)
    }

    fn find_board(&self, project_id: TargetId) -> Result<Option<TargetId>> {
        Ok(self
            .boards
            .iter()
            .find(|b| b.project_id == project_id)
            .map(|b| b.id))
    }

    fn create_board(&mut self, project_id: TargetId, board: &NewBoard) -> Result<TargetId> {
        let id = self.board_seq.next();
        self.boards.push(StoredBoard {
            id,
            project_id,
            record: board.clone(),
        });
        Ok(id)
    }

    fn add_tracker(&mut self, project_id: TargetId, tracker: &str) -> Result<bool> {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == project_id) else {
            return Ok(false);
        };
        if project.record.trackers.iter().any(|t| t == tracker) {
            return Ok(false);
        }
        project.record.trackers.push(tracker.to_string());
        Ok(true)
    }

    fn find_message(&self, key: &MessageKey) -> Result<Option<TargetId>> {
        let found = match key {
            MessageKey::Topic { subject, board_id } => self.messages.iter().find(|m| {
                m.record.parent_id.is_none()
                    && m.record.board_id == *board_id
                    && m.record.subject == *subject
            }),
            MessageKey::Reply {
                subject,
                parent_id,
                project_id,
                created_on,
            } => self.messages.iter().find(|m| {
                m.record.parent_id == Some(*parent_id)
                    && m.record.subject == *subject
                    && m.record.created_on == *created_on
                    && self.board_project(m.record.board_id) == Some(*project_id)
            }),
        };
        Ok(found.map(|m| m.id))
    }

    fn create_message(&mut self, message: &NewMessage) -> Result<TargetId> {
        let id = self.message_seq.next();
        self.messages.push(StoredMessage {
            id,
            record: message.clone(),
        });
        Ok(id)
    }

    fn find_issue(&self, key: &IssueKey) -> Result<Option<TargetId>> {
        let found = match key {
            IssueKey::InProject {
                subject,
                project_id,
            } => self
                .issues
                .iter()
                .find(|i| i.record.project_id == *project_id && i.record.subject == *subject),
            IssueKey::Child { subject, parent_id } => self
                .issues
                .iter()
                .find(|i| i.record.parent_id == Some(*parent_id) && i.record.subject == *subject),
        };
        Ok(found.map(|i| i.id))
    }

    fn create_issue(&mut self, issue: &NewIssue) -> Result<TargetId> {
        let id = self.issue_seq.next();
        self.issues.push(StoredIssue {
            id,
            record: issue.clone(),
        });
        Ok(id)
    }

    fn create_journal(&mut self, journal: &NewJournal) -> Result<TargetId> {
        let id = self.journal_seq.next();
        self.journals.push(StoredJournal {
            id,
            record: journal.clone(),
        });
        Ok(id)
    }

    fn delete_project(&mut self, id: TargetId) -> Result<bool> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return Ok(false);
        }

        for project in &mut self.projects {
            if project.record.parent_id == Some(id) {
                project.record.parent_id = None;
            }
        }

        let boards: HashSet<TargetId> = self
            .boards
            .iter()
            .filter(|b| b.project_id == id)
            .map(|b| b.id)
            .collect();
        self.remove_boards(&boards);

        let issues: HashSet<TargetId> = self
            .issues
            .iter()
            .filter(|i| i.record.project_id == id)
            .map(|i| i.id)
            .collect();
        self.remove_issues(issues);

        Ok(true)
    }

    fn record_import(&mut self, source_hash: &str) -> Result<()> {
        self.last_import_hash = Some(source_hash.to_string());
        Ok(())
    }
}
