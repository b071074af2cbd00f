//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing:
//! - Test environment setup with a temporary directory for property files
//! - Command builder helpers that isolate runs from the caller's environment

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with an isolated directory for property files.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// Environment variables are still read; use this to test `--no-env`
    /// and environment-driven behavior.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("propchain").expect("Failed to find propchain binary");
        cmd.env_remove("PROPCHAIN_NO_ENV");
        cmd.env_remove("PROPCHAIN_LOG_MODE");
        cmd
    }

    /// Get a command builder that ignores environment variables.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--no-env");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file under the temporary directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
