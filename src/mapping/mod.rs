//! Entity mapping: source records to idempotent find-or-create steps.
//!
//! Each `ensure_*` method derives the normalized target record (truncated
//! subject, cleansed body, resolved parents and users), asks the store for an
//! existing match on the same scope key, and creates the record only when
//! nothing matches. Every decision is emitted to the run's [`Sink`] and
//! recorded in the [`RunContext`] lookup tables so children can find their
//! parents.
//!
//! Matching is done on the truncated subject within a scope. Two long source
//! titles that truncate to the same text in the same scope match each other.

pub mod filter;
pub mod users;

use crate::config::ImportConfig;
use crate::emit::{Operation, Outcome, Sink};
use crate::error::{ImportError, RecordKind, Result};
use crate::model::{
    Comment, IssueKey, MessageKey, NewBoard, NewIssue, NewJournal, NewMessage, NewProject,
    Organization, Post, Project, TargetId, TodoItem, TodoList,
};
use crate::storage::EntityStore;
use crate::undo::UndoPlanner;
use crate::util::text::{center_truncate, cleanse_html, cleanse_quotes, left, to_slug};
use serde::Serialize;
use std::collections::HashMap;

/// Modules switched on for every created project.
pub const ENABLED_MODULES: [&str; 2] = ["issue_tracking", "boards"];

/// Separator between a body and its author signature on messages.
const MESSAGE_SIGNATURE: &str = "\n\n-- \n";
/// Separator used on issue descriptions and journal notes.
const ISSUE_SIGNATURE: &str = " \n\n-- \n";

/// A project (or organization) mapped in this run, with its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedProject {
    pub id: TargetId,
    pub board_id: TargetId,
}

/// A top-level message, remembered with the subject its replies derive from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedMessage {
    pub id: TargetId,
    pub subject: String,
    pub project: MappedProject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedIssue {
    pub id: TargetId,
    pub project_id: TargetId,
}

/// Created/matched counts for one kind of record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub created: usize,
    pub existing: usize,
}

impl Tally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Existing => self.existing += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub projects: Tally,
    pub boards: Tally,
    pub messages: Tally,
    pub issues: Tally,
    pub journals: usize,
    pub trackers_linked: usize,
    pub skipped: usize,
}

impl RunStats {
    fn observe(&mut self, op: &Operation) {
        match op {
            Operation::EnsureProject { outcome, .. } => self.projects.record(*outcome),
            Operation::EnsureBoard { outcome, .. } => self.boards.record(*outcome),
            Operation::EnsureMessage { outcome, .. } => self.messages.record(*outcome),
            Operation::EnsureIssue { outcome, .. } => self.issues.record(*outcome),
            Operation::CreateJournal { .. } => self.journals += 1,
            Operation::LinkTracker { .. } => self.trackers_linked += 1,
            Operation::Skip { .. } => self.skipped += 1,
            Operation::Trace { .. } | Operation::DeleteProject { .. } => {}
        }
    }
}

/// State threaded through one traversal: the source-id lookup tables, the
/// sink, and the undo planner observing the same stream.
pub struct RunContext<'s> {
    sink: &'s mut dyn Sink,
    undo: UndoPlanner,
    stats: RunStats,
    organizations: HashMap<String, MappedProject>,
    projects: HashMap<String, MappedProject>,
    messages: HashMap<String, MappedMessage>,
    replies: HashMap<String, TargetId>,
    todo_lists: HashMap<String, MappedIssue>,
    todos: HashMap<String, MappedIssue>,
    journals: HashMap<String, TargetId>,
}

impl<'s> RunContext<'s> {
    pub fn new(sink: &'s mut dyn Sink) -> Self {
        Self {
            sink,
            undo: UndoPlanner::new(),
            stats: RunStats::default(),
            organizations: HashMap::new(),
            projects: HashMap::new(),
            messages: HashMap::new(),
            replies: HashMap::new(),
            todo_lists: HashMap::new(),
            todos: HashMap::new(),
            journals: HashMap::new(),
        }
    }

    /// Send an operation to the sink and let the planner and stats see it.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn emit(&mut self, op: Operation) -> Result<()> {
        self.undo.observe(&op);
        self.stats.observe(&op);
        self.sink.emit(&op)
    }

    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn trace(&mut self, message: impl Into<String>) -> Result<()> {
        self.emit(Operation::trace(message))
    }

    /// Record that a source record and its subtree were left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn skip(&mut self, kind: RecordKind, source_id: &str, reason: &str) -> Result<()> {
        tracing::info!(kind = %kind, source_id, reason, "Skipping");
        self.emit(Operation::Skip {
            kind,
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        })
    }

    #[must_use]
    pub const fn undo(&self) -> &UndoPlanner {
        &self.undo
    }

    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Give the sink back for post-run emission (rollback).
    pub fn sink(&mut self) -> &mut dyn Sink {
        &mut *self.sink
    }

    #[must_use]
    pub fn organization(&self, source_id: &str) -> Option<MappedProject> {
        self.organizations.get(source_id).copied()
    }

    #[must_use]
    pub fn project(&self, source_id: &str) -> Option<MappedProject> {
        self.projects.get(source_id).copied()
    }

    #[must_use]
    pub fn message(&self, source_id: &str) -> Option<&MappedMessage> {
        self.messages.get(source_id)
    }

    #[must_use]
    pub fn reply(&self, source_id: &str) -> Option<TargetId> {
        self.replies.get(source_id).copied()
    }

    #[must_use]
    pub fn todo_list(&self, source_id: &str) -> Option<MappedIssue> {
        self.todo_lists.get(source_id).copied()
    }

    #[must_use]
    pub fn todo(&self, source_id: &str) -> Option<MappedIssue> {
        self.todos.get(source_id).copied()
    }

    #[must_use]
    pub fn journal(&self, source_id: &str) -> Option<TargetId> {
        self.journals.get(source_id).copied()
    }
}

/// Find-or-create for every node type, against one store and configuration.
pub struct EntityMapper<'a, S: EntityStore + ?Sized> {
    store: &'a mut S,
    config: &'a ImportConfig,
}

impl<'a, S: EntityStore + ?Sized> EntityMapper<'a, S> {
    pub fn new(store: &'a mut S, config: &'a ImportConfig) -> Self {
        Self { store, config }
    }

    fn truncate(&self, text: &str, limit: usize) -> Result<String> {
        center_truncate(text, limit, &self.config.ellipsis)
    }

    /// Truncated project name. `name` is already quote-cleansed.
    fn project_name(&self, name: &str) -> Result<String> {
        self.truncate(name, self.config.project_name_room())
    }

    fn board_for(&self, short_name: &str, full_name: &str) -> NewBoard {
        NewBoard {
            name: format!("{short_name}{}", self.config.name_append),
            description: left(full_name, self.config.limits.board_description).to_string(),
        }
    }

    fn new_project(
        &self,
        short_name: String,
        description: String,
        trackers: Vec<String>,
        parent_id: Option<TargetId>,
    ) -> NewProject {
        NewProject {
            identifier: to_slug(&short_name),
            name: short_name,
            description,
            enabled_modules: ENABLED_MODULES.iter().map(ToString::to_string).collect(),
            trackers,
            parent_id,
        }
    }

    /// Import an organization as a parent project.
    ///
    /// # Errors
    ///
    /// Returns an error if truncation, the store, or the sink fails.
    pub fn ensure_organization(
        &mut self,
        ctx: &mut RunContext<'_>,
        org: &Organization,
    ) -> Result<MappedProject> {
        let options = &self.config.organizations;
        let name = cleanse_quotes(&org.name);
        let short_name = self.project_name(&format!("{}{name}", options.short_name_prefix))?;
        let description = format!("{}{name}", options.name_prefix);
        let board = self.board_for(&short_name, &name);
        let project = self.new_project(
            short_name,
            description,
            vec![self.config.default_tracker.clone()],
            self.config.parent_project_id,
        );

        ctx.trace(format!(
            "About to create {} as parent project {} ('{}').",
            org.kind, org.id, project.name
        ))?;
        let mapped = self.ensure_project_record(ctx, &org.id, project, board)?;
        ctx.organizations.insert(org.id.clone(), mapped);
        Ok(mapped)
    }

    /// # Errors
    ///
    /// Returns an error if truncation, the store, or the sink fails.
    pub fn ensure_project(
        &mut self,
        ctx: &mut RunContext<'_>,
        source: &Project,
        parent_id: Option<TargetId>,
    ) -> Result<MappedProject> {
        let name = cleanse_quotes(&source.name);
        let short_name = self.project_name(&name)?;
        let board = self.board_for(&short_name, &name);
        let project = self.new_project(
            short_name,
            name,
            vec![
                self.config.default_tracker.clone(),
                self.config.list_tracker.clone(),
            ],
            parent_id,
        );

        ctx.trace(format!(
            "About to create project {} ('{}').",
            source.id, project.name
        ))?;
        let mapped = self.ensure_project_record(ctx, &source.id, project, board)?;
        ctx.projects.insert(source.id.clone(), mapped);
        Ok(mapped)
    }

    fn ensure_project_record(
        &mut self,
        ctx: &mut RunContext<'_>,
        source_id: &str,
        project: NewProject,
        board: NewBoard,
    ) -> Result<MappedProject> {
        if let Some(id) = self.store.find_project(&project.name)? {
            tracing::debug!(source_id, target_id = %id, "Project exists");
            ctx.emit(Operation::EnsureProject {
                source_id: source_id.to_string(),
                outcome: Outcome::Existing,
                target_id: id,
                project,
            })?;

            let (board_id, outcome) = match self.store.find_board(id)? {
                Some(board_id) => (board_id, Outcome::Existing),
                None => {
                    ctx.trace(format!("Re-creating board of project #{id}."))?;
                    (self.store.create_board(id, &board)?, Outcome::Created)
                }
            };
            ctx.emit(Operation::EnsureBoard {
                project_id: id,
                outcome,
                target_id: board_id,
                board,
            })?;
            return Ok(MappedProject { id, board_id });
        }

        let id = self.store.create_project(&project)?;
        ctx.emit(Operation::EnsureProject {
            source_id: source_id.to_string(),
            outcome: Outcome::Created,
            target_id: id,
            project,
        })?;
        let board_id = self.store.create_board(id, &board)?;
        tracing::debug!(source_id, target_id = %id, board_id = %board_id, "Project created");
        ctx.emit(Operation::EnsureBoard {
            project_id: id,
            outcome: Outcome::Created,
            target_id: board_id,
            board,
        })?;
        Ok(MappedProject { id, board_id })
    }

    /// Map a post to a top-level message on its project's board.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::DanglingReference`] if the post's project was not
    /// mapped, or an error from truncation, the store, or the sink.
    pub fn ensure_post(&mut self, ctx: &mut RunContext<'_>, post: &Post) -> Result<TargetId> {
        let project = ctx
            .project(&post.project_id)
            .ok_or_else(|| ImportError::dangling(RecordKind::Post, &post.id, &post.project_id))?;

        let title = cleanse_html(&cleanse_quotes(&post.title));
        let subject = self.truncate(&title, self.config.message_subject_room())?;
        let body = cleanse_html(&cleanse_quotes(&post.body));
        let author_name = cleanse_quotes(&post.author_name);

        ctx.trace(format!(
            "About to create post {} as message under project {}.",
            post.id, post.project_id
        ))?;

        let key = MessageKey::Topic {
            subject: subject.clone(),
            board_id: project.board_id,
        };
        let message = NewMessage {
            board_id: project.board_id,
            parent_id: None,
            subject: subject.clone(),
            content: format!("{body}{MESSAGE_SIGNATURE}{author_name}"),
            author: self.config.users.map_user(post.author_id.as_deref()),
            created_on: post.posted_on,
        };
        let id = self.find_or_create_message(ctx, &post.id, key, message)?;
        ctx.messages.insert(
            post.id.clone(),
            MappedMessage {
                id,
                subject,
                project,
            },
        );
        Ok(id)
    }

    /// Map a post comment to a reply under its post's message.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::DanglingReference`] if the commented post was not
    /// mapped, or an error from the store or the sink.
    pub fn ensure_post_comment(
        &mut self,
        ctx: &mut RunContext<'_>,
        comment: &Comment,
    ) -> Result<TargetId> {
        let parent = ctx.message(&comment.commentable_id).cloned().ok_or_else(|| {
            ImportError::dangling(RecordKind::PostComment, &comment.id, &comment.commentable_id)
        })?;

        let subject = format!("{}{}", self.config.reply_prefix, parent.subject);
        let body = cleanse_html(&cleanse_quotes(&comment.body));
        let author_name = cleanse_quotes(&comment.author_name);

        ctx.trace(format!(
            "About to create post comment {} as reply under message #{}.",
            comment.id, parent.id
        ))?;

        let key = MessageKey::Reply {
            subject: subject.clone(),
            parent_id: parent.id,
            project_id: parent.project.id,
            created_on: comment.created_at,
        };
        let message = NewMessage {
            board_id: parent.project.board_id,
            parent_id: Some(parent.id),
            subject,
            content: format!("{body}{MESSAGE_SIGNATURE}{author_name}"),
            author: self.config.users.map_user(comment.author_id.as_deref()),
            created_on: comment.created_at,
        };
        let id = self.find_or_create_message(ctx, &comment.id, key, message)?;
        ctx.replies.insert(comment.id.clone(), id);
        Ok(id)
    }

    fn find_or_create_message(
        &mut self,
        ctx: &mut RunContext<'_>,
        source_id: &str,
        key: MessageKey,
        message: NewMessage,
    ) -> Result<TargetId> {
        let (target_id, outcome) = match self.store.find_message(&key)? {
            Some(id) => (id, Outcome::Existing),
            None => (self.store.create_message(&message)?, Outcome::Created),
        };
        tracing::debug!(source_id, target_id = %target_id, ?outcome, "Message");
        ctx.emit(Operation::EnsureMessage {
            source_id: source_id.to_string(),
            outcome,
            target_id,
            key,
            message,
        })?;
        Ok(target_id)
    }

    /// Map a todo list to a top-level issue with the list tracker.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::DanglingReference`] if the list's project was not
    /// mapped, or an error from truncation, the store, or the sink.
    pub fn ensure_todo_list(
        &mut self,
        ctx: &mut RunContext<'_>,
        list: &TodoList,
    ) -> Result<MappedIssue> {
        let project = ctx.project(&list.project_id).ok_or_else(|| {
            ImportError::dangling(RecordKind::TodoList, &list.id, &list.project_id)
        })?;

        let name = cleanse_quotes(&list.name);
        let subject = self.truncate(&name, self.config.limits.issue_subject)?;

        ctx.trace(format!(
            "About to create todo-list {} ('{subject}') as issue under project {}.",
            list.id, list.project_id
        ))?;

        let key = IssueKey::InProject {
            subject: subject.clone(),
            project_id: project.id,
        };
        let issue = NewIssue {
            project_id: project.id,
            parent_id: None,
            subject,
            description: cleanse_quotes(&list.description),
            status: self.status(list.complete),
            tracker: self.config.list_tracker.clone(),
            author: self.config.users.map_user(list.creator_id.as_deref()),
            assignee: None,
            created_on: None,
        };
        let id = self.find_or_create_issue(ctx, &list.id, key, issue)?;
        let mapped = MappedIssue {
            id,
            project_id: project.id,
        };
        ctx.todo_lists.insert(list.id.clone(), mapped);
        Ok(mapped)
    }

    /// Map a todo item to a sub-issue of its list's issue.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::DanglingReference`] if the item's list was not
    /// mapped, or an error from truncation, the store, or the sink.
    pub fn ensure_todo_item(
        &mut self,
        ctx: &mut RunContext<'_>,
        item: &TodoItem,
    ) -> Result<MappedIssue> {
        let list = ctx.todo_list(&item.todo_list_id).ok_or_else(|| {
            ImportError::dangling(RecordKind::TodoItem, &item.id, &item.todo_list_id)
        })?;

        let content = cleanse_quotes(&item.content);
        let subject = self.truncate(&content, self.config.limits.issue_subject)?;
        let creator_name = cleanse_quotes(&item.creator_name);
        let users = &self.config.users;

        ctx.trace(format!(
            "About to create todo {} as sub-issue under issue #{}.",
            item.id, list.id
        ))?;

        let key = IssueKey::Child {
            subject: subject.clone(),
            parent_id: list.id,
        };
        let issue = NewIssue {
            project_id: list.project_id,
            parent_id: Some(list.id),
            subject,
            description: format!("{content}{ISSUE_SIGNATURE}{creator_name}"),
            status: self.status(item.completed),
            tracker: self.config.default_tracker.clone(),
            author: users.map_user(item.creator_id.as_deref()),
            assignee: item
                .responsible_party_id
                .as_deref()
                .map(|id| users.map_user(Some(id))),
            created_on: Some(item.created_at),
        };
        let id = self.find_or_create_issue(ctx, &item.id, key, issue)?;
        let mapped = MappedIssue {
            id,
            project_id: list.project_id,
        };
        ctx.todos.insert(item.id.clone(), mapped);
        Ok(mapped)
    }

    fn status(&self, complete: bool) -> String {
        if complete {
            self.config.closed_status.clone()
        } else {
            self.config.default_status.clone()
        }
    }

    fn find_or_create_issue(
        &mut self,
        ctx: &mut RunContext<'_>,
        source_id: &str,
        key: IssueKey,
        issue: NewIssue,
    ) -> Result<TargetId> {
        let (target_id, outcome) = match self.store.find_issue(&key)? {
            Some(id) => (id, Outcome::Existing),
            None => (self.store.create_issue(&issue)?, Outcome::Created),
        };
        tracing::debug!(source_id, target_id = %target_id, ?outcome, "Issue");

        let (project_id, tracker) = (issue.project_id, issue.tracker.clone());
        ctx.emit(Operation::EnsureIssue {
            source_id: source_id.to_string(),
            outcome,
            target_id,
            key,
            issue,
        })?;

        if outcome.is_created() && self.store.add_tracker(project_id, &tracker)? {
            ctx.emit(Operation::LinkTracker {
                project_id,
                tracker,
            })?;
        }
        Ok(target_id)
    }

    /// Append a todo comment as a journal on its item's issue. Never matched.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::DanglingReference`] if the commented item was not
    /// mapped, or an error from the store or the sink.
    pub fn create_journal(&mut self, ctx: &mut RunContext<'_>, comment: &Comment) -> Result<TargetId> {
        let issue = ctx.todo(&comment.commentable_id).ok_or_else(|| {
            ImportError::dangling(RecordKind::TodoComment, &comment.id, &comment.commentable_id)
        })?;

        if ctx.journals.contains_key(&comment.id) {
            tracing::warn!(source_id = %comment.id, "Todo comment seen once before");
        }

        ctx.trace(format!(
            "About to create todo journal item {} on issue #{}.",
            comment.id, issue.id
        ))?;

        let journal = NewJournal {
            issue_id: issue.id,
            notes: format!(
                "{}{ISSUE_SIGNATURE}{}",
                cleanse_html(&comment.body),
                cleanse_quotes(&comment.author_name)
            ),
            user: self.config.users.map_user(comment.author_id.as_deref()),
            created_on: comment.created_at,
        };
        let id = self.store.create_journal(&journal)?;
        tracing::debug!(source_id = %comment.id, target_id = %id, "Journal created");
        ctx.emit(Operation::CreateJournal {
            source_id: comment.id.clone(),
            target_id: id,
            journal,
        })?;
        ctx.journals.insert(comment.id.clone(), id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::RecordingSink;
    use crate::mapping::users::UserRef;
    use crate::model::ProjectStatus;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            status: ProjectStatus::Active,
            company_id: None,
        }
    }

    fn post(id: &str, project_id: &str, title: &str) -> Post {
        Post {
            id: id.to_string(),
            project_id: project_id.to_string(),
            title: title.to_string(),
            body: "Body".to_string(),
            author_id: Some("404".to_string()),
            author_name: "Pat".to_string(),
            posted_on: Utc.with_ymd_and_hms(2010, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    fn comment(id: &str, parent: &str, day: u32) -> Comment {
        Comment {
            id: id.to_string(),
            commentable_id: parent.to_string(),
            body: "&lt;b&gt;ok&lt;br/&gt;".to_string(),
            author_id: None,
            author_name: "Sam".to_string(),
            created_at: Utc.with_ymd_and_hms(2010, 3, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn project_is_created_once_with_board() {
        let config = ImportConfig::default();
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();

        {
            let mut ctx = RunContext::new(&mut sink);
            let mut mapper = EntityMapper::new(&mut store, &config);
            let first = mapper.ensure_project(&mut ctx, &project("1", "Alpha"), None).unwrap();
            let second = mapper.ensure_project(&mut ctx, &project("1", "Alpha"), None).unwrap();
            assert_eq!(first, second);
            assert_eq!(ctx.stats().projects, Tally { created: 1, existing: 1 });
            assert_eq!(ctx.undo().created_projects(), &[first.id]);
        }
        assert_eq!(sink.created().count(), 2);

        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.boards().len(), 1);
        let stored = &store.projects()[0].record;
        assert_eq!(stored.identifier, "alpha");
        assert_eq!(stored.enabled_modules, vec!["issue_tracking", "boards"]);
        assert_eq!(stored.trackers, vec!["Bug", "Todo List"]);
    }

    #[test]
    fn long_project_name_is_truncated_before_matching() {
        let config = ImportConfig::default();
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();
        let long = "Customer Portal Relaunch Phase Two Extended";

        let mut ctx = RunContext::new(&mut sink);
        let mut mapper = EntityMapper::new(&mut store, &config);
        let first = mapper.ensure_project(&mut ctx, &project("1", long), None).unwrap();
        let again = mapper.ensure_project(&mut ctx, &project("1", long), None).unwrap();
        assert_eq!(first, again);
        drop(ctx);

        let stored = &store.projects()[0].record;
        assert_eq!(stored.name.chars().count(), 30);
        assert_eq!(stored.description, long);
    }

    #[test]
    fn quote_escapes_stay_within_limits() {
        let config = ImportConfig::default();
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();
        let name = format!("{}\\C{}", "a".repeat(10), "b".repeat(30));
        let list_name = format!("s\\x {}\\M", "c".repeat(300));

        let mut ctx = RunContext::new(&mut sink);
        let mut mapper = EntityMapper::new(&mut store, &config);
        mapper.ensure_project(&mut ctx, &project("1", &name), None).unwrap();
        mapper
            .ensure_todo_list(
                &mut ctx,
                &TodoList {
                    id: "30".to_string(),
                    project_id: "1".to_string(),
                    name: list_name,
                    description: String::new(),
                    complete: false,
                    creator_id: None,
                },
            )
            .unwrap();
        drop(ctx);

        let stored = &store.projects()[0].record;
        assert_eq!(stored.name.chars().count(), 30);
        assert!(stored.name.starts_with("aaaaaaaaaa\\\\C"));
        assert!(!stored.name.contains("\\\\\\"));
        let subject = &store.issues()[0].record.subject;
        assert_eq!(subject.chars().count(), 255);
        assert!(subject.starts_with("s\\\\x "));
        assert!(subject.ends_with("\\\\M"));
    }

    #[test]
    fn missing_board_is_recreated_under_existing_project() {
        let config = ImportConfig::default();
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();

        let id = {
            let mut ctx = RunContext::new(&mut sink);
            EntityMapper::new(&mut store, &config)
                .ensure_project(&mut ctx, &project("1", "Alpha"), None)
                .unwrap()
                .id
        };
        store.drop_boards(id);

        let mut sink = RecordingSink::new();
        let mut ctx = RunContext::new(&mut sink);
        let mapped = EntityMapper::new(&mut store, &config)
            .ensure_project(&mut ctx, &project("1", "Alpha"), None)
            .unwrap();
        assert_eq!(mapped.id, id);
        assert_eq!(ctx.stats().boards, Tally { created: 1, existing: 0 });
        assert!(ctx.undo().is_empty());
        drop(ctx);
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.boards().len(), 1);
    }

    #[test]
    fn post_and_replies_map_to_messages() {
        let config = ImportConfig::default();
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();

        let mut ctx = RunContext::new(&mut sink);
        let mut mapper = EntityMapper::new(&mut store, &config);
        mapper.ensure_project(&mut ctx, &project("1", "Alpha"), None).unwrap();
        let topic = mapper.ensure_post(&mut ctx, &post("10", "1", "Kickoff")).unwrap();
        let first = mapper.ensure_post_comment(&mut ctx, &comment("20", "10", 2)).unwrap();
        let second = mapper.ensure_post_comment(&mut ctx, &comment("21", "10", 3)).unwrap();
        assert_ne!(first, second);
        assert_eq!(ctx.reply("20"), Some(first));
        assert_eq!(ctx.reply("21"), Some(second));
        assert_eq!(ctx.reply("10"), None);
        drop(ctx);

        let messages = store.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].id, topic);
        assert_eq!(messages[0].record.author, UserRef::Anonymous);
        assert_eq!(messages[0].record.content, "Body\n\n-- \nPat");
        assert_eq!(messages[1].record.subject, "Re: Kickoff");
        assert_eq!(messages[1].record.parent_id, Some(topic));
        assert_eq!(messages[1].record.content, "<b>ok\n\n-- \nSam");
    }

    #[test]
    fn unmapped_parent_is_dangling() {
        let config = ImportConfig::default();
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();
        let mut ctx = RunContext::new(&mut sink);
        let mut mapper = EntityMapper::new(&mut store, &config);

        let err = mapper
            .ensure_post(&mut ctx, &post("10", "999", "Orphan"))
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::DanglingReference { kind: RecordKind::Post, ref id, ref parent_id }
                if id == "10" && parent_id == "999"
        ));
    }

    #[test]
    fn todo_hierarchy_maps_to_issues_and_journals() {
        let mut config = ImportConfig::default();
        config.users = [("7".to_string(), 3)].into_iter().collect();
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();

        let mut ctx = RunContext::new(&mut sink);
        let mut mapper = EntityMapper::new(&mut store, &config);
        let project = mapper.ensure_project(&mut ctx, &project("1", "Alpha"), None).unwrap();
        let list = mapper
            .ensure_todo_list(
                &mut ctx,
                &TodoList {
                    id: "30".to_string(),
                    project_id: "1".to_string(),
                    name: "Launch".to_string(),
                    description: "Things".to_string(),
                    complete: true,
                    creator_id: Some("7".to_string()),
                },
            )
            .unwrap();
        let item = mapper
            .ensure_todo_item(
                &mut ctx,
                &TodoItem {
                    id: "31".to_string(),
                    todo_list_id: "30".to_string(),
                    content: "Ship \"it\"".to_string(),
                    completed: false,
                    created_at: Utc.with_ymd_and_hms(2010, 3, 3, 9, 0, 0).unwrap(),
                    responsible_party_id: Some("8".to_string()),
                    creator_id: Some("7".to_string()),
                    creator_name: "Pat".to_string(),
                    comments_count: Some(1),
                },
            )
            .unwrap();
        let journal = mapper.create_journal(&mut ctx, &comment("40", "31", 4)).unwrap();
        assert_eq!(ctx.journal("40"), Some(journal));
        drop(ctx);

        assert_eq!(list.project_id, project.id);
        assert_eq!(item.project_id, project.id);
        let issues = store.issues();
        assert_eq!(issues[0].record.status, "Closed");
        assert_eq!(issues[0].record.tracker, "Todo List");
        assert_eq!(issues[0].record.author, UserRef::User(3));
        assert_eq!(issues[1].record.subject, "Ship it");
        assert_eq!(issues[1].record.parent_id, Some(list.id));
        assert_eq!(issues[1].record.status, "New");
        assert_eq!(issues[1].record.tracker, "Bug");
        assert_eq!(issues[1].record.assignee, Some(UserRef::Anonymous));
        assert_eq!(issues[1].record.description, "Ship it \n\n-- \nPat");
        assert_eq!(store.journals().len(), 1);
        assert_eq!(store.journals()[0].record.issue_id, item.id);
    }
}
