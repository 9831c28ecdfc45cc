//! Hierarchy walk and run orchestration.
//!
//! Organizations (when enabled) are mapped first, then every project in
//! document order. Under each included, non-archived project the walk visits
//! posts with their comments, then todo lists with their items and item
//! comments. The first error aborts the run; with rollback enabled the projects
//! created so far are deleted before the error is returned.

use crate::config::ImportConfig;
use crate::emit::{Operation, Sink};
use crate::error::{RecordKind, Result};
use crate::mapping::{EntityMapper, RunContext, RunStats};
use crate::model::TargetId;
use crate::source::{Export, ProjectNode};
use crate::storage::EntityStore;
use crate::undo::{UndoSummary, execute_plan};
use crate::util::content_hash;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// SHA-256 of the export text.
    pub source_hash: String,
    pub stats: RunStats,
    /// Projects created by this run, in creation order.
    pub created_projects: Vec<TargetId>,
}

impl ImportReport {
    /// Delete operations that revert this run.
    #[must_use]
    pub fn undo_plan(&self) -> Vec<Operation> {
        self.created_projects
            .iter()
            .map(|&target_id| Operation::DeleteProject { target_id })
            .collect()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "Source:   {}", self.source_hash)?;
        writeln!(
            f,
            "Projects: {} created, {} existing",
            s.projects.created, s.projects.existing
        )?;
        writeln!(
            f,
            "Boards:   {} created, {} existing",
            s.boards.created, s.boards.existing
        )?;
        writeln!(
            f,
            "Messages: {} created, {} existing",
            s.messages.created, s.messages.existing
        )?;
        writeln!(
            f,
            "Issues:   {} created, {} existing",
            s.issues.created, s.issues.existing
        )?;
        writeln!(f, "Journals: {} created", s.journals)?;
        write!(f, "Skipped:  {}", s.skipped)
    }
}

/// Read an export file and run it against `store`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or the run fails.
pub fn import_file<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &ImportConfig,
    path: &Path,
    sink: &mut dyn Sink,
) -> Result<ImportReport> {
    let text = fs::read_to_string(path)?;
    tracing::info!(path = %path.display(), bytes = text.len(), "Reading export");
    run_import(store, config, &text, sink)
}

/// Transform one export into find-or-create operations against `store`.
///
/// # Errors
///
/// Returns the first error raised while walking. When
/// `config.rollback_on_failure` is set, the projects created so far are deleted
/// first; the original error is still returned.
pub fn run_import<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &ImportConfig,
    text: &str,
    sink: &mut dyn Sink,
) -> Result<ImportReport> {
    let source_hash = content_hash(text.as_bytes());
    let export = Export::parse(text)?;

    let mut ctx = RunContext::new(sink);
    let walked = {
        let mut mapper = EntityMapper::new(store, config);
        walk(&export, config, &mut mapper, &mut ctx)
    };

    if let Err(err) = walked {
        tracing::error!(error = %err, "Import aborted");
        if config.rollback_on_failure {
            let plan = ctx.undo().plan();
            tracing::warn!(projects = plan.len(), "Rolling back created projects");
            match rollback(store, &plan, ctx.sink()) {
                Ok(summary) => {
                    tracing::warn!(deleted = summary.deleted.len(), "Rollback complete");
                }
                Err(undo_err) => {
                    tracing::error!(error = %undo_err, "Rollback failed");
                }
            }
        }
        return Err(err);
    }

    store.record_import(&source_hash)?;
    let report = ImportReport {
        source_hash,
        stats: ctx.stats().clone(),
        created_projects: ctx.undo().created_projects().to_vec(),
    };
    tracing::info!(
        projects = report.stats.projects.created,
        messages = report.stats.messages.created,
        issues = report.stats.issues.created,
        journals = report.stats.journals,
        "Import complete"
    );
    Ok(report)
}

fn rollback<S: EntityStore + ?Sized>(
    store: &mut S,
    plan: &[Operation],
    sink: &mut dyn Sink,
) -> Result<UndoSummary> {
    sink.emit(&Operation::trace(format!(
        "Import failed; deleting {} created project(s).",
        plan.len()
    )))?;
    execute_plan(store, plan, sink)
}

/// Visit organizations then projects in document order.
///
/// # Errors
///
/// Returns the first malformed record, dangling reference, or store failure.
pub fn walk<S: EntityStore + ?Sized>(
    export: &Export<'_>,
    config: &ImportConfig,
    mapper: &mut EntityMapper<'_, S>,
    ctx: &mut RunContext<'_>,
) -> Result<()> {
    let mut excluded_orgs = HashSet::new();
    if config.organizations.import {
        for org in export.organizations()? {
            if config.organizations.filter.is_included(&org.id) {
                mapper.ensure_organization(ctx, &org)?;
            } else {
                ctx.skip(RecordKind::Organization, &org.id, "excluded")?;
                excluded_orgs.insert(org.id);
            }
        }
    }

    for node in export.projects() {
        let project = node.read()?;
        if project.is_archived() {
            ctx.skip(RecordKind::Project, &project.id, "archived")?;
            continue;
        }
        if !config.projects.is_included(&project.id) {
            ctx.skip(RecordKind::Project, &project.id, "excluded")?;
            continue;
        }
        if let Some(company) = project
            .company_id
            .as_ref()
            .filter(|id| excluded_orgs.contains(*id))
        {
            ctx.skip(
                RecordKind::Project,
                &project.id,
                &format!("organization {company} excluded"),
            )?;
            continue;
        }

        let parent = project
            .company_id
            .as_deref()
            .filter(|_| config.organizations.import)
            .and_then(|company| ctx.organization(company))
            .map(|org| org.id)
            .or(config.parent_project_id);

        mapper.ensure_project(ctx, &project, parent)?;
        walk_project(node, mapper, ctx)?;
    }
    Ok(())
}

fn walk_project<S: EntityStore + ?Sized>(
    node: ProjectNode<'_, '_>,
    mapper: &mut EntityMapper<'_, S>,
    ctx: &mut RunContext<'_>,
) -> Result<()> {
    for post_node in node.posts() {
        mapper.ensure_post(ctx, &post_node.read()?)?;
        for comment in post_node.comments() {
            mapper.ensure_post_comment(ctx, &comment.read()?)?;
        }
    }

    for list_node in node.todo_lists() {
        mapper.ensure_todo_list(ctx, &list_node.read()?)?;
        for item_node in list_node.items() {
            let item = item_node.read()?;
            mapper.ensure_todo_item(ctx, &item)?;
            if !item.may_have_comments() {
                continue;
            }
            for comment in item_node.comments() {
                mapper.create_journal(ctx, &comment.read()?)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::RecordingSink;
    use crate::storage::MemoryStore;

    const EXPORT: &str = r"<account>
  <projects>
    <project><id>1</id><name>Alpha</name><status>active</status></project>
    <project><id>2</id><name>Old</name><status>archived</status>
      <posts><post><id>5</id><project-id>2</project-id></post></posts>
    </project>
  </projects>
</account>";

    #[test]
    fn archived_project_children_are_never_read() {
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();
        let report = run_import(&mut store, &ImportConfig::default(), EXPORT, &mut sink).unwrap();

        assert_eq!(report.stats.projects.created, 1);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.last_import_hash(), Some(report.source_hash.as_str()));
    }

    #[test]
    fn report_renders_counts() {
        let mut store = MemoryStore::new();
        let mut sink = RecordingSink::new();
        let report = run_import(&mut store, &ImportConfig::default(), EXPORT, &mut sink).unwrap();
        let text = report.to_string();
        assert!(text.contains("Projects: 1 created, 0 existing"));
        assert!(text.contains("Skipped:  1"));
        assert_eq!(report.undo_plan().len(), 1);
    }
}
