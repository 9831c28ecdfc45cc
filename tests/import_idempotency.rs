//! Re-running an export must match every existing record and only append
//! journals.

mod common;

use basecamp_redmine::config::ImportConfig;
use basecamp_redmine::emit::{Operation, Outcome, RecordingSink};
use basecamp_redmine::run_import;
use common::fixtures::{SAMPLE_JOURNALS, sample_export};

#[test]
fn second_run_creates_nothing_but_journals_in_memory() {
    let mut store = common::memory_store();
    let config = ImportConfig::default();
    let export = sample_export();

    let first = run_import(&mut store, &config, &export, &mut RecordingSink::new()).unwrap();
    assert_eq!(first.stats.projects.created, 2);
    assert_eq!(first.stats.boards.created, 2);
    assert_eq!(first.stats.messages.created, 4);
    assert_eq!(first.stats.issues.created, 5);
    assert_eq!(first.stats.journals, SAMPLE_JOURNALS);

    let mut sink = RecordingSink::new();
    let second = run_import(&mut store, &config, &export, &mut sink).unwrap();
    assert_eq!(second.stats.projects.created, 0);
    assert_eq!(second.stats.boards.created, 0);
    assert_eq!(second.stats.messages.created, 0);
    assert_eq!(second.stats.issues.created, 0);
    assert_eq!(second.stats.projects.existing, 2);
    assert_eq!(second.stats.messages.existing, 4);
    assert_eq!(second.stats.issues.existing, 5);
    assert_eq!(second.stats.journals, SAMPLE_JOURNALS);
    assert!(second.created_projects.is_empty());
    assert!(second.undo_plan().is_empty());

    assert_eq!(store.projects().len(), 2);
    assert_eq!(store.messages().len(), 4);
    assert_eq!(store.issues().len(), 5);
    assert_eq!(store.journals().len(), SAMPLE_JOURNALS * 2);

    assert!(sink.ops.iter().all(|op| !matches!(
        op,
        Operation::EnsureProject { outcome: Outcome::Created, .. }
            | Operation::EnsureMessage { outcome: Outcome::Created, .. }
            | Operation::EnsureIssue { outcome: Outcome::Created, .. }
    )));
}

#[test]
fn second_run_creates_nothing_but_journals_in_sqlite() {
    let mut store = common::test_db();
    let config = ImportConfig::default();
    let export = sample_export();

    run_import(&mut store, &config, &export, &mut RecordingSink::new()).unwrap();
    let after_first = store.counts().unwrap();

    let second = run_import(&mut store, &config, &export, &mut RecordingSink::new()).unwrap();
    let after_second = store.counts().unwrap();

    assert_eq!(second.stats.projects.created, 0);
    assert_eq!(second.stats.messages.created, 0);
    assert_eq!(second.stats.issues.created, 0);
    assert_eq!(after_second.projects, after_first.projects);
    assert_eq!(after_second.boards, after_first.boards);
    assert_eq!(after_second.messages, after_first.messages);
    assert_eq!(after_second.issues, after_first.issues);
    assert_eq!(after_second.journals, after_first.journals + SAMPLE_JOURNALS);
}

#[test]
fn replies_on_the_same_post_stay_distinct_across_runs() {
    let mut store = common::memory_store();
    let config = ImportConfig::default();
    let export = sample_export();

    run_import(&mut store, &config, &export, &mut RecordingSink::new()).unwrap();
    run_import(&mut store, &config, &export, &mut RecordingSink::new()).unwrap();

    let replies: Vec<_> = store
        .messages()
        .iter()
        .filter(|m| m.record.parent_id.is_some())
        .collect();
    assert_eq!(replies.len(), 2);
    assert!(replies.iter().all(|m| m.record.subject == "Re: Kickoff"));
}

#[test]
fn organization_projects_are_matched_on_rerun() {
    let mut store = common::memory_store();
    let mut config = ImportConfig::default();
    config.organizations.import = true;
    let export = sample_export();

    let first = run_import(&mut store, &config, &export, &mut RecordingSink::new()).unwrap();
    assert_eq!(first.stats.projects.created, 4);

    let second = run_import(&mut store, &config, &export, &mut RecordingSink::new()).unwrap();
    assert_eq!(second.stats.projects.created, 0);
    assert_eq!(second.stats.projects.existing, 4);
}
