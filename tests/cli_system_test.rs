//! Integration tests for system-wide commands: status, summary, override,
//! control check, gating, and the audit log.

mod common;

use common::TestEnv;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;

fn parse_stdout(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

fn locked_env() -> TestEnv {
    let env = TestEnv::new();
    env.write_config(&json!({
        "security": { "active_profile": "locked" },
        "security_profiles": {
            "locked": {
                "features": {
                    "workflow_control": { "enabled": false },
                    "feature_control": { "enabled": false }
                }
            },
            "open": { "features": {} }
        },
        "workflow": { "active_profile": "default" },
        "workflow_profiles": { "default": {}, "research": {} },
        "features": { "model_overview": { "enabled": true } },
        "controls": { "security_control": { "enabled": true } }
    }));
    env
}

// ==================== status ====================

#[test]
fn test_status_reports_per_entry_sources() {
    let env = locked_env();

    let output = env
        .tl()
        .args(["status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    assert_eq!(value["active_profile"], json!("locked"));
    assert_eq!(value["admin_override"], json!(false));
    let profiles = value["available_profiles"].as_array().unwrap();
    assert!(profiles.contains(&json!("locked")));
    assert!(profiles.contains(&json!("open")));

    // Entry catalog is the union of the global sections
    assert_eq!(value["entries"]["model_overview"]["enabled"], json!(true));
    assert_eq!(value["entries"]["model_overview"]["source"], json!("features"));
    assert_eq!(value["entries"]["security_control"]["source"], json!("controls"));
}

#[test]
fn test_status_with_admin_override_active() {
    let env = locked_env();
    env.set_admin_override();

    let output = env
        .tl()
        .args(["status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    assert_eq!(value["admin_override"], json!(true));
    // Global-section decisions are not flipped by the override
    assert_eq!(value["entries"]["model_overview"]["source"], json!("features"));
}

#[test]
fn test_status_human_output() {
    let env = locked_env();

    env.tl()
        .args(["--human", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Security Status ==="))
        .stdout(predicate::str::contains("Active Profile: locked"))
        .stdout(predicate::str::contains("Admin Override: inactive"));
}

#[test]
fn test_status_without_config_uses_fallback_defaults() {
    let env = TestEnv::new();

    let output = env
        .tl()
        .args(["status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    assert_eq!(value["active_profile"], json!("open"));
    assert_eq!(value["entries"]["godmode"]["enabled"], json!(false));
    assert_eq!(value["entries"]["godmode"]["source"], json!("features"));
    assert_eq!(value["entries"]["feature_control"]["enabled"], json!(true));
}

// ==================== summary ====================

#[test]
fn test_summary_spans_all_profile_types() {
    let env = locked_env();

    let output = env
        .tl()
        .args(["summary"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    assert_eq!(value["admin_override"], json!(false));
    assert_eq!(value["profiles"]["workflow"]["active_profile"], json!("default"));
    assert_eq!(value["profiles"]["security"]["active_profile"], json!("locked"));
    // Every registered type appears even when the document never mentions it
    assert_eq!(
        value["profiles"]["reasoning_internal"]["active_profile"],
        json!("default")
    );

    let enabled = value["enabled_features"].as_array().unwrap();
    assert!(enabled.contains(&json!("model_overview")));
    assert!(enabled.contains(&json!("security_control")));
    assert!(!enabled.contains(&json!("workflow_control")));
}

// ==================== override / control check ====================

#[test]
fn test_override_reports_sentinel_state_and_path() {
    let env = TestEnv::new();

    let output = env
        .tl()
        .args(["override"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = parse_stdout(&output);
    assert_eq!(value["active"], json!(false));
    assert_eq!(
        value["path"],
        json!(env.override_path().display().to_string())
    );

    env.set_admin_override();

    let output = env
        .tl()
        .args(["override"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(parse_stdout(&output)["active"], json!(true));
}

#[test]
fn test_control_check_reads_controls_section_only() {
    let env = locked_env();

    let output = env
        .tl()
        .args(["control", "check", "security_control"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(parse_stdout(&output)["enabled"], json!(true));

    // model_overview lives in features, not controls, so the lookup misses
    let output = env
        .tl()
        .args(["control", "check", "model_overview"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(parse_stdout(&output)["enabled"], json!(false));
}

// ==================== gating ====================

#[test]
fn test_gated_profile_set_fails_without_writing() {
    let env = locked_env();

    env.tl()
        .args(["profile", "set", "workflow", "research"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Workflow control tool is disabled by current security profile. Admin override required.",
        ));

    assert_eq!(
        env.read_config()["workflow"]["active_profile"],
        json!("default")
    );
}

#[test]
fn test_admin_override_reopens_gated_commands() {
    let env = locked_env();
    env.set_admin_override();

    env.tl()
        .args(["profile", "set", "workflow", "research"])
        .assert()
        .success();

    assert_eq!(
        env.read_config()["workflow"]["active_profile"],
        json!("research")
    );
}

// ==================== audit log ====================

#[test]
fn test_mutating_command_appends_audit_entry() {
    let env = locked_env();
    env.set_admin_override();

    env.tl()
        .args(["profile", "set", "workflow", "research"])
        .assert()
        .success();

    let content = fs::read_to_string(env.audit_path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);

    let entry: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(entry["command"], json!("profile set"));
    assert_eq!(entry["args"]["profile_type"], json!("workflow"));
    assert_eq!(entry["args"]["name"], json!("research"));
    assert_eq!(entry["success"], json!(true));
    assert!(entry.get("error").is_none());
    assert!(entry["duration_ms"].is_u64());
    assert!(entry["user"].is_string());
}

#[test]
fn test_read_only_commands_are_not_audited() {
    let env = locked_env();

    env.tl().args(["status"]).assert().success();
    env.tl()
        .args(["feature", "check", "model_overview"])
        .assert()
        .success();

    assert!(!env.audit_path().exists());
}

#[test]
fn test_gated_mutation_is_audited_as_failure() {
    let env = locked_env();

    env.tl()
        .args(["feature", "set", "model_overview", "off"])
        .assert()
        .failure();

    let content = fs::read_to_string(env.audit_path()).unwrap();
    let entry: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(entry["command"], json!("feature set"));
    assert_eq!(entry["success"], json!(false));
    assert!(
        entry["error"]
            .as_str()
            .unwrap()
            .contains("disabled by current security profile")
    );
}

#[test]
fn test_audit_log_can_be_disabled() {
    let env = TestEnv::new();
    env.write_config(&json!({
        "audit_log_enabled": false,
        "controls": { "feature_control": { "enabled": true } },
        "features": { "model_overview": { "enabled": true } }
    }));

    env.tl()
        .args(["feature", "set", "model_overview", "off"])
        .assert()
        .success();

    assert!(!env.audit_path().exists());
}

#[test]
fn test_audit_log_honors_custom_path() {
    let env = TestEnv::new();
    let custom = env.dir.path().join("logs").join("trail.jsonl");
    fs::create_dir_all(custom.parent().unwrap()).unwrap();
    env.write_config(&json!({
        "audit_log_path": custom.to_string_lossy(),
        "controls": { "feature_control": { "enabled": true } },
        "features": { "model_overview": { "enabled": true } }
    }));

    env.tl()
        .args(["feature", "set", "model_overview", "off"])
        .assert()
        .success();

    assert!(custom.exists());
    assert!(!env.audit_path().exists());
}

#[test]
fn test_successive_mutations_accumulate_entries() {
    let env = TestEnv::new();
    env.write_config(&json!({
        "workflow": { "active_profile": "default" },
        "workflow_profiles": { "default": { "features": {} } },
        "controls": { "feature_control": { "enabled": true } }
    }));

    env.tl()
        .args(["feature", "enable", "workflow", "recall"])
        .assert()
        .success();
    env.tl()
        .args(["feature", "disable", "workflow", "recall"])
        .assert()
        .success();

    let content = fs::read_to_string(env.audit_path()).unwrap();
    let commands: Vec<String> = content
        .lines()
        .map(|line| {
            serde_json::from_str::<Value>(line).unwrap()["command"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(commands, vec!["feature enable", "feature disable"]);
}

// ==================== malformed document recovery ====================

#[test]
fn test_malformed_document_degrades_to_defaults() {
    let env = TestEnv::new();
    fs::write(env.control_path(), "{ not json").unwrap();

    let output = env
        .tl()
        .args(["status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    assert_eq!(value["active_profile"], json!("open"));
    assert_eq!(value["entries"]["feature_control"]["enabled"], json!(true));
}
