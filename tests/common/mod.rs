#![allow(dead_code)]

use basecamp_redmine::storage::{MemoryStore, SqliteStore};
use std::sync::Once;
use tempfile::TempDir;

pub mod cli;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        basecamp_redmine::logging::init_test_logging();
    });
}

pub fn test_db() -> SqliteStore {
    init_test_logging();
    SqliteStore::open_memory().expect("Failed to create test database")
}

pub fn test_db_with_dir() -> (SqliteStore, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("redmine.db");
    let store = SqliteStore::open(&db_path).expect("Failed to create test database");
    (store, dir)
}

pub fn memory_store() -> MemoryStore {
    init_test_logging();
    MemoryStore::new()
}
