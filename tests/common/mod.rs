//! Common test utilities for tiller integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's real control document.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
pub use tempfile::TempDir;

/// A test environment with an isolated control file and override sentinel.
///
/// The `tl()` method returns a `Command` that sets `TL_CONTROL_FILE` and
/// `TL_OVERRIDE_FILE` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an isolated directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the tl binary pointed at this environment.
    pub fn tl(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tl"));
        cmd.env("TL_CONTROL_FILE", self.control_path());
        cmd.env("TL_OVERRIDE_FILE", self.override_path());
        cmd
    }

    /// Path of the control document.
    pub fn control_path(&self) -> PathBuf {
        self.dir.path().join("control.json")
    }

    /// Path of the admin override sentinel.
    pub fn override_path(&self) -> PathBuf {
        self.dir.path().join("admin_override.lock")
    }

    /// Path of the default audit log (sibling of the control file).
    pub fn audit_path(&self) -> PathBuf {
        self.dir.path().join("audit.log")
    }

    /// Seed the control document.
    pub fn write_config(&self, doc: &serde_json::Value) {
        let content = serde_json::to_string_pretty(doc).unwrap();
        fs::write(self.control_path(), content).unwrap();
    }

    /// Read the control document back for assertions.
    pub fn read_config(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.control_path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    /// Create the admin override sentinel.
    pub fn set_admin_override(&self) {
        fs::write(self.override_path(), "").unwrap();
    }

    /// Remove the admin override sentinel.
    pub fn clear_admin_override(&self) {
        let _ = fs::remove_file(self.override_path());
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
