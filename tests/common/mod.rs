//! Shared test infrastructure for integration tests.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const SOURCE_TREE: &str = "Animals\n\tDog\n\tCat\n\tFish\n";
pub const TARGET_TREE: &str = "Animals\n\tDog\n\tFeline\n\tFish\n\t\tCarp\n";

pub fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

/// Path to a configuration shipped under `conf/`.
pub fn conf(name: &str) -> PathBuf {
    manifest_dir().join("conf").join(name)
}

/// Result of one `smatch` run.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        RunResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Temporary working directory the binary runs in.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace {
            dir: TempDir::new().expect("create temp workspace"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn read(&self, name: &str) -> String {
        let path = self.path(name);
        fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Run the binary with `args` inside the workspace.
    pub fn run(&self, args: &[&str]) -> RunResult {
        self.run_in(self.dir.path(), args)
    }

    fn run_in(&self, cwd: &Path, args: &[&str]) -> RunResult {
        Command::new(env!("CARGO_BIN_EXE_smatch"))
            .current_dir(cwd)
            .args(args)
            .env("NO_COLOR", "1")
            .env("SMATCH_LOG", "debug")
            .env_remove("RUST_LOG")
            .output()
            .expect("spawn smatch")
            .into()
    }

    /// Source and target fixtures for the animal taxonomies.
    pub fn animals(&self) {
        self.write("source.txt", SOURCE_TREE);
        self.write("target.txt", TARGET_TREE);
    }
}
