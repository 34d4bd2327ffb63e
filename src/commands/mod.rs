//! Command implementations for the Tiller CLI.
//!
//! Each handler decodes its arguments into the engine's typed operations,
//! applies control gating where the command mutates or inspects a profile
//! type, and returns a serializable record implementing [`Output`].
//!
//! Gating: profile commands are gated by their type's control entry
//! (e.g. `workflow_control`), feature-mutating commands by
//! `feature_control`. The gate is resolved through the full precedence
//! chain, so an admin override can reopen a tool that the active security
//! profile locked down. Read-only global queries are never gated.

use serde::Serialize;
use serde_json::json;
use std::str::FromStr;

use crate::cli::Toggle;
use crate::control::{SecurityState, SystemControl, SystemSummary};
use crate::features::FeatureResult;
use crate::profiles::{ProfileKind, ProfileState, SetProfileResult};
use crate::store::ConfigDoc;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;

    /// Whether the command succeeded (drives the process exit code).
    fn succeeded(&self) -> bool {
        true
    }
}

fn to_json_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Generic failure record (unknown type, gated tool).
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub error: String,
}

impl ErrorOutput {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl Output for ErrorOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        format!("Error: {}", self.error)
    }

    fn succeeded(&self) -> bool {
        false
    }
}

fn gated(display_name: &str) -> Box<dyn Output> {
    Box::new(ErrorOutput::new(format!(
        "{} control tool is disabled by current security profile. Admin override required.",
        display_name
    )))
}

fn parse_kind(profile_type: &str) -> Result<ProfileKind, Box<dyn Output>> {
    ProfileKind::from_str(profile_type).map_err(|e| {
        Box::new(ErrorOutput::new(e.to_string())) as Box<dyn Output>
    })
}

fn profile_gate(system: &SystemControl, kind: ProfileKind) -> Option<Box<dyn Output>> {
    let descriptor = kind.descriptor();
    if system.is_feature_enabled(descriptor.control_key) {
        None
    } else {
        Some(gated(descriptor.display_name))
    }
}

fn feature_gate(system: &SystemControl) -> Option<Box<dyn Output>> {
    if system.is_feature_enabled("feature_control") {
        None
    } else {
        Some(gated("Feature"))
    }
}

// ============================================================================
// Profile commands
// ============================================================================

/// Active profile and available choices for one type.
#[derive(Debug, Serialize)]
pub struct ProfileOverview {
    pub profile_type: String,
    pub display_name: String,
    pub active_profile: String,
    pub available_profiles: Vec<String>,
}

impl Output for ProfileOverview {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Active {} Profile: {}\nAvailable Profiles: {}",
            self.display_name,
            self.active_profile,
            self.available_profiles.join(", ")
        )
    }
}

pub fn profile_get(system: &SystemControl, profile_type: &str) -> Box<dyn Output> {
    let kind = match parse_kind(profile_type) {
        Ok(kind) => kind,
        Err(error) => return error,
    };
    if let Some(denied) = profile_gate(system, kind) {
        return denied;
    }

    Box::new(ProfileOverview {
        profile_type: kind.as_str().to_string(),
        display_name: kind.descriptor().display_name.to_string(),
        active_profile: system.get_active_profile(kind),
        available_profiles: system.get_available_profiles(kind),
    })
}

impl Output for SetProfileResult {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        if !self.success {
            let mut text = format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            );
            if !self.available_profiles.is_empty() {
                text.push_str(&format!(
                    "\nAvailable profiles: {}",
                    self.available_profiles.join(", ")
                ));
            }
            return text;
        }
        self.message.clone().unwrap_or_default()
    }

    fn succeeded(&self) -> bool {
        self.success
    }
}

pub fn profile_set(system: &SystemControl, profile_type: &str, name: &str) -> Box<dyn Output> {
    let kind = match parse_kind(profile_type) {
        Ok(kind) => kind,
        Err(error) => return error,
    };
    if let Some(denied) = profile_gate(system, kind) {
        return denied;
    }

    Box::new(system.set_active_profile(kind, name))
}

/// Full state report for one type.
#[derive(Debug, Serialize)]
pub struct ProfileStateOutput {
    pub profile_type: String,
    #[serde(skip)]
    pub display_name: String,
    #[serde(flatten)]
    pub state: ProfileState,
}

impl Output for ProfileStateOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("=== {} Status ===", self.display_name),
            format!("Active Profile: {}", self.state.active_profile),
            format!(
                "Available Profiles: {}",
                self.state.available_profiles.join(", ")
            ),
        ];
        if let Some(description) = &self.state.description {
            if !description.is_empty() {
                lines.push(format!("Description: {}", description));
            }
        }
        lines.push(String::new());
        lines.push("Profile Features:".to_string());
        if self.state.features.is_empty() {
            lines.push("  - (No features defined)".to_string());
        } else {
            for (feature, config) in &self.state.features {
                let enabled = config
                    .get("enabled")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                let status = if enabled { "ENABLED" } else { "disabled" };
                lines.push(format!("  - {}: {}", feature, status));
            }
        }
        lines.join("\n")
    }
}

pub fn profile_state(system: &SystemControl, profile_type: &str) -> Box<dyn Output> {
    let kind = match parse_kind(profile_type) {
        Ok(kind) => kind,
        Err(error) => return error,
    };
    if let Some(denied) = profile_gate(system, kind) {
        return denied;
    }

    Box::new(ProfileStateOutput {
        profile_type: kind.as_str().to_string(),
        display_name: kind.descriptor().display_name.to_string(),
        state: system.get_state(kind),
    })
}

/// Registered profile types.
#[derive(Debug, Serialize)]
pub struct TypesOutput {
    pub profile_types: Vec<TypeEntry>,
}

#[derive(Debug, Serialize)]
pub struct TypeEntry {
    pub type_id: String,
    pub display_name: String,
    pub control: String,
}

impl Output for TypesOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec!["Registered profile types:".to_string()];
        for entry in &self.profile_types {
            lines.push(format!(
                "  - {} ({}, gated by {})",
                entry.type_id, entry.display_name, entry.control
            ));
        }
        lines.join("\n")
    }
}

pub fn profile_types() -> Box<dyn Output> {
    Box::new(TypesOutput {
        profile_types: ProfileKind::ALL
            .iter()
            .map(|kind| {
                let descriptor = kind.descriptor();
                TypeEntry {
                    type_id: kind.as_str().to_string(),
                    display_name: descriptor.display_name.to_string(),
                    control: descriptor.control_key.to_string(),
                }
            })
            .collect(),
    })
}

// ============================================================================
// Feature commands
// ============================================================================

impl Output for FeatureResult {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        if !self.success {
            return format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            );
        }
        self.message.clone().unwrap_or_default()
    }

    fn succeeded(&self) -> bool {
        self.success
    }
}

pub fn feature_enable(system: &SystemControl, profile_type: &str, name: &str) -> Box<dyn Output> {
    let kind = match parse_kind(profile_type) {
        Ok(kind) => kind,
        Err(error) => return error,
    };
    if let Some(denied) = feature_gate(system) {
        return denied;
    }

    Box::new(system.enable_feature(kind, name))
}

pub fn feature_disable(system: &SystemControl, profile_type: &str, name: &str) -> Box<dyn Output> {
    let kind = match parse_kind(profile_type) {
        Ok(kind) => kind,
        Err(error) => return error,
    };
    if let Some(denied) = feature_gate(system) {
        return denied;
    }

    Box::new(system.disable_feature(kind, name))
}

impl Output for crate::control::SetFeatureOptionResult {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        if !self.success {
            return format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            );
        }
        let mut text = self.message.clone().unwrap_or_default();
        if let Some(note) = &self.note {
            text.push_str(&format!("\nNote: {}", note));
        }
        text
    }

    fn succeeded(&self) -> bool {
        self.success
    }
}

pub fn feature_set(system: &SystemControl, name: &str, state: Toggle) -> Box<dyn Output> {
    if let Some(denied) = feature_gate(system) {
        return denied;
    }

    Box::new(system.set_feature_option(name, state.as_bool()))
}

/// Resolved enablement for one feature.
#[derive(Debug, Serialize)]
pub struct FeatureCheckOutput {
    pub feature: String,
    pub enabled: bool,
    pub source: crate::control::FeatureSource,
}

impl Output for FeatureCheckOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        let status = if self.enabled { "ENABLED" } else { "disabled" };
        format!("Feature '{}': {} (source: {})", self.feature, status, self.source)
    }
}

pub fn feature_check(system: &SystemControl, name: &str) -> Box<dyn Output> {
    let decision = system.resolve_feature(name);
    Box::new(FeatureCheckOutput {
        feature: name.to_string(),
        enabled: decision.enabled,
        source: decision.source,
    })
}

/// Full configuration of one feature.
#[derive(Debug, Serialize)]
pub struct FeatureConfigOutput {
    pub feature: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigDoc>,
}

impl Output for FeatureConfigOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        match &self.config {
            Some(config) => format!(
                "Feature '{}':\n{}",
                self.feature,
                to_json_pretty(config)
            ),
            None => format!("Feature '{}' not configured", self.feature),
        }
    }
}

pub fn feature_config(system: &SystemControl, name: &str) -> Box<dyn Output> {
    let config = system.get_feature_config(name);
    Box::new(FeatureConfigOutput {
        feature: name.to_string(),
        found: config.is_some(),
        config,
    })
}

/// Known features with resolved status.
#[derive(Debug, Serialize)]
pub struct FeatureListOutput {
    pub features: std::collections::BTreeMap<String, crate::control::FeatureDecision>,
}

impl Output for FeatureListOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        if self.features.is_empty() {
            return "No features defined".to_string();
        }
        let mut lines = vec!["Features:".to_string()];
        for (name, decision) in &self.features {
            let status = if decision.enabled { "ENABLED" } else { "disabled" };
            lines.push(format!("  - {}: {} ({})", name, status, decision.source));
        }
        lines.join("\n")
    }
}

pub fn feature_list(system: &SystemControl) -> Box<dyn Output> {
    let features = system
        .get_available_features()
        .into_iter()
        .map(|name| {
            let decision = system.resolve_feature(&name);
            (name, decision)
        })
        .collect();
    Box::new(FeatureListOutput { features })
}

// ============================================================================
// Control / status / summary / override
// ============================================================================

/// Control entry enablement.
#[derive(Debug, Serialize)]
pub struct ControlCheckOutput {
    pub control: String,
    pub enabled: bool,
}

impl Output for ControlCheckOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        let status = if self.enabled { "enabled" } else { "disabled" };
        format!("Control '{}': {}", self.control, status)
    }
}

pub fn control_check(system: &SystemControl, name: &str) -> Box<dyn Output> {
    Box::new(ControlCheckOutput {
        control: name.to_string(),
        enabled: system.is_control_enabled(name),
    })
}

impl Output for SecurityState {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            "=== Security Status ===".to_string(),
            format!("Active Profile: {}", self.active_profile),
            format!("Available Profiles: {}", self.available_profiles.join(", ")),
            format!(
                "Admin Override: {}",
                if self.admin_override { "ACTIVE" } else { "inactive" }
            ),
            String::new(),
            "Entries:".to_string(),
        ];
        if self.entries.is_empty() {
            lines.push("  - (none)".to_string());
        }
        for (name, decision) in &self.entries {
            let status = if decision.enabled { "ENABLED" } else { "disabled" };
            lines.push(format!("  - {}: {} ({})", name, status, decision.source));
        }
        lines.join("\n")
    }
}

pub fn status(system: &SystemControl) -> Box<dyn Output> {
    Box::new(system.get_security_state())
}

impl Output for SystemSummary {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec!["=== System Summary ===".to_string()];
        lines.push(format!(
            "Admin Override: {}",
            if self.admin_override { "ACTIVE" } else { "inactive" }
        ));
        lines.push(format!(
            "Enabled Features: {}",
            if self.enabled_features.is_empty() {
                "(none)".to_string()
            } else {
                self.enabled_features.join(", ")
            }
        ));
        lines.push(format!(
            "Available Features: {}",
            self.available_features.join(", ")
        ));
        lines.push(String::new());
        lines.push("Profiles:".to_string());
        for (type_id, state) in &self.profiles {
            let active = state
                .get("active_profile")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("default");
            lines.push(format!("  - {}: {}", type_id, active));
        }
        lines.join("\n")
    }
}

pub fn summary(system: &SystemControl) -> Box<dyn Output> {
    Box::new(system.get_system_summary())
}

/// Admin override sentinel report.
#[derive(Debug, Serialize)]
pub struct OverrideOutput {
    pub active: bool,
    pub path: String,
}

impl Output for OverrideOutput {
    fn to_json(&self) -> String {
        to_json_pretty(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Admin override {} (sentinel: {})",
            if self.active { "ACTIVE" } else { "inactive" },
            self.path
        )
    }
}

pub fn override_status(system: &SystemControl) -> Box<dyn Output> {
    Box::new(OverrideOutput {
        active: system.is_admin_override_active(),
        path: system.store().override_path().display().to_string(),
    })
}

/// Serialize a command for the audit log: name plus argument record, and
/// whether the command can mutate the control document.
pub fn describe_command(command: &crate::cli::Commands) -> (String, serde_json::Value, bool) {
    use crate::cli::{Commands, ControlCommands, FeatureCommands, ProfileCommands};

    match command {
        Commands::Profile { command } => match command {
            ProfileCommands::Get { profile_type } => (
                "profile get".to_string(),
                json!({ "profile_type": profile_type }),
                false,
            ),
            ProfileCommands::Set { profile_type, name } => (
                "profile set".to_string(),
                json!({ "profile_type": profile_type, "name": name }),
                true,
            ),
            ProfileCommands::State { profile_type } => (
                "profile state".to_string(),
                json!({ "profile_type": profile_type }),
                false,
            ),
            ProfileCommands::Types => ("profile types".to_string(), json!({}), false),
        },
        Commands::Feature { command } => match command {
            FeatureCommands::Enable { profile_type, name } => (
                "feature enable".to_string(),
                json!({ "profile_type": profile_type, "name": name }),
                true,
            ),
            FeatureCommands::Disable { profile_type, name } => (
                "feature disable".to_string(),
                json!({ "profile_type": profile_type, "name": name }),
                true,
            ),
            FeatureCommands::Set { name, state } => (
                "feature set".to_string(),
                json!({ "name": name, "state": format!("{:?}", state).to_lowercase() }),
                true,
            ),
            FeatureCommands::Check { name } => {
                ("feature check".to_string(), json!({ "name": name }), false)
            }
            FeatureCommands::Config { name } => {
                ("feature config".to_string(), json!({ "name": name }), false)
            }
            FeatureCommands::List => ("feature list".to_string(), json!({}), false),
        },
        Commands::Control { command } => match command {
            ControlCommands::Check { name } => {
                ("control check".to_string(), json!({ "name": name }), false)
            }
        },
        Commands::Status => ("status".to_string(), json!({}), false),
        Commands::Summary => ("summary".to_string(), json!({}), false),
        Commands::Override => ("override".to_string(), json!({}), false),
    }
}
