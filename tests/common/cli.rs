//! Helpers for driving the `bc2rm` binary.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding an export, a database and output files.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn db(&self) -> PathBuf {
        self.path("redmine.db")
    }

    /// `bc2rm` with the workspace as working directory and a clean environment.
    pub fn bc2rm(&self) -> Command {
        let mut cmd = Command::cargo_bin("bc2rm").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("BC2RM_DB");
        cmd
    }
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read output")
}
