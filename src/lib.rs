//! Tiller - A behavior profile and feature gate control library for AI agents.
//!
//! This library provides the core functionality for the `tl` CLI tool:
//! profile type registry, active-profile selection, per-profile feature
//! toggles, and layered feature/control resolution with admin override.

pub mod audit;
pub mod cli;
pub mod commands;
pub mod control;
pub mod features;
pub mod profiles;
pub mod store;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::control::SystemControl;
    use crate::store::ConfigStore;

    /// Test environment with an isolated control file and override sentinel.
    ///
    /// Every store built from one of these points into its own `TempDir`,
    /// so unit tests can run in parallel without sharing state.
    pub struct TestEnv {
        pub dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        pub fn control_path(&self) -> PathBuf {
            self.dir.path().join("control.json")
        }

        pub fn override_path(&self) -> PathBuf {
            self.dir.path().join("admin_override.lock")
        }

        /// Build a store scoped to this environment (pure DI, no env vars).
        pub fn store(&self) -> ConfigStore {
            ConfigStore::new(self.control_path(), self.override_path())
        }

        /// Build a facade scoped to this environment.
        pub fn system(&self) -> SystemControl {
            SystemControl::new(self.store())
        }

        /// Write a control document for the test to start from.
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
}

/// Library-level error type for Tiller operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Tiller operations.
pub type Result<T> = std::result::Result<T, Error>;
