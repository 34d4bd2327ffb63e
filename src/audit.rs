//! Audit logging for tiller commands.
//!
//! Every state-changing CLI invocation is appended as one JSON object per
//! line to the audit log. Logging never fails a command: problems degrade
//! to a stderr warning.
//!
//! The control document can tune it with two tolerant top-level keys:
//! `audit_log_enabled` (boolean, default true) and `audit_log_path`
//! (string, default `audit.log` next to the control file, `~` expands to
//! the home directory).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::store::ConfigStore;

/// A single audit log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// ISO 8601 timestamp when the command ran
    pub timestamp: DateTime<Utc>,

    /// Command name (e.g., "profile set", "feature enable")
    pub command: String,

    /// Command arguments as JSON
    pub args: Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Append an entry to the audit log.
///
/// Consults the control document for the enabled flag and log path, then
/// writes one JSONL record. Any failure is reported as a warning and
/// otherwise ignored.
pub fn log_command(
    store: &ConfigStore,
    command: &str,
    args: Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    let doc = store.load();

    let enabled = doc
        .get("audit_log_enabled")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if !enabled {
        return;
    }

    let log_path = match doc.get("audit_log_path").and_then(Value::as_str) {
        Some(path) => expand_home(Path::new(path)),
        None => store
            .control_path()
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("audit.log"),
    };

    let entry = AuditEntry {
        timestamp: Utc::now(),
        command: command.to_string(),
        args,
        success,
        error,
        duration_ms,
        user: current_user(),
    };

    if let Err(e) = write_entry(&log_path, &entry) {
        eprintln!("Warning: Failed to write audit log: {}", e);
    }
}

fn write_entry(path: &Path, entry: &AuditEntry) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;
    use serde_json::json;

    fn read_entries(path: &Path) -> Vec<AuditEntry> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_log_command_appends_jsonl_records() {
        let env = TestEnv::new();
        let store = env.store();

        log_command(&store, "profile set", json!({ "type": "workflow" }), true, None, 12);
        log_command(
            &store,
            "feature enable",
            json!({ "feature": "recall" }),
            false,
            Some("Failed to write configuration".to_string()),
            3,
        );

        let entries = read_entries(&env.dir.path().join("audit.log"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command, "profile set");
        assert!(entries[0].success);
        assert!(entries[0].error.is_none());
        assert_eq!(entries[1].args, json!({ "feature": "recall" }));
        assert_eq!(
            entries[1].error.as_deref(),
            Some("Failed to write configuration")
        );
    }

    #[test]
    fn test_log_respects_disabled_flag() {
        let env = TestEnv::new();
        env.write_config(&json!({ "audit_log_enabled": false }));
        let store = env.store();

        log_command(&store, "profile set", json!({}), true, None, 1);

        assert!(!env.dir.path().join("audit.log").exists());
    }

    #[test]
    fn test_log_honors_configured_path() {
        let env = TestEnv::new();
        let custom = env.dir.path().join("logs/tiller.jsonl");
        env.write_config(&json!({
            "audit_log_path": custom.to_string_lossy()
        }));
        let store = env.store();

        log_command(&store, "summary", json!({}), true, None, 1);

        assert_eq!(read_entries(&custom).len(), 1);
        assert!(!env.dir.path().join("audit.log").exists());
    }

    #[test]
    fn test_expand_home_only_touches_tilde_prefix() {
        let plain = Path::new("/var/log/tiller.log");
        assert_eq!(expand_home(plain), plain);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/tiller.log")), home.join("tiller.log"));
        }
    }
}
