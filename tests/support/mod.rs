use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("kanri.csv")
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join(".kanri.toml");
        fs::write(&path, contents).expect("write config");
        path
    }

    /// A `kanri` command running inside this workspace.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("kanri").expect("kanri binary");
        cmd.current_dir(self.dir.path());
        cmd.env_remove("KANRI_FILE");
        cmd.env_remove("RUST_LOG");
        cmd
    }
}
