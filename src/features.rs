//! Per-profile feature toggles.
//!
//! Features live inside a profile entry at
//! `[<catalog key>, <nested key>?, <profile name>, "features"]`. The
//! navigation to that map is shared by both mutations; what differs is the
//! rule each [`FeatureAction`] applies once it gets there.
//!
//! A mutation that changes nothing (enabling an enabled feature, disabling
//! an absent or disabled one) succeeds without touching the file.

use serde::Serialize;
use serde_json::{Value, json};

use crate::profiles::{ProfileKind, active_profile_in};
use crate::store::{ConfigDoc, ConfigStore, ensure_object};

/// A feature mutation, decoded once at the CLI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureAction {
    Enable,
    Disable,
}

impl FeatureAction {
    /// Apply this action to the feature's entry in a profile feature map.
    ///
    /// Returns `true` when the map actually changed (caller persists), or
    /// `false` for a no-op (the returned result carries the no-op message).
    fn apply(self, features: &mut ConfigDoc, feature: &str, profile: &str) -> (bool, FeatureResult) {
        let currently_enabled = features
            .get(feature)
            .map(|entry| entry.get("enabled").and_then(Value::as_bool).unwrap_or(false));

        match self {
            FeatureAction::Enable => match currently_enabled {
                Some(true) => (
                    false,
                    FeatureResult::no_op(feature, format!("Feature '{}' already enabled", feature)),
                ),
                _ => {
                    features.insert(
                        feature.to_string(),
                        json!({ "enabled": true, "reference": format!("{}.md", feature) }),
                    );
                    (true, FeatureResult::changed(feature, profile, "enabled"))
                }
            },
            FeatureAction::Disable => match currently_enabled {
                None => (
                    false,
                    FeatureResult::no_op(feature, format!("Feature '{}' not configured", feature)),
                ),
                Some(false) => (
                    false,
                    FeatureResult::no_op(feature, format!("Feature '{}' already disabled", feature)),
                ),
                Some(true) => {
                    if let Some(Value::Object(entry)) = features.get_mut(feature) {
                        entry.insert("enabled".to_string(), Value::Bool(false));
                    }
                    (true, FeatureResult::changed(feature, profile, "disabled"))
                }
            },
        }
    }
}

/// Result record for a feature mutation.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Profile the mutation applied to; absent for no-ops and errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl FeatureResult {
    fn no_op(feature: &str, message: String) -> Self {
        Self {
            success: true,
            error: None,
            message: Some(message),
            feature: Some(feature.to_string()),
            profile: None,
        }
    }

    fn changed(feature: &str, profile: &str, verb: &str) -> Self {
        Self {
            success: true,
            error: None,
            message: Some(format!(
                "Feature '{}' {} in profile '{}'",
                feature, verb, profile
            )),
            feature: Some(feature.to_string()),
            profile: Some(profile.to_string()),
        }
    }

    fn write_failed() -> Self {
        Self {
            success: false,
            error: Some("Failed to write configuration".to_string()),
            message: None,
            feature: None,
            profile: None,
        }
    }
}

/// Applies [`FeatureAction`]s to the active profile of a type.
pub struct FeatureManager<'a> {
    store: &'a ConfigStore,
}

impl<'a> FeatureManager<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    /// Enable or disable a feature in the active profile of `kind`.
    ///
    /// The features map (and any intermediate level) is created on demand,
    /// so mutating a profile the document never mentioned still works. Only
    /// an actual state change is persisted; a save failure turns an
    /// otherwise-successful mutation into an error.
    pub fn modify_feature(
        &self,
        kind: ProfileKind,
        feature: &str,
        action: FeatureAction,
    ) -> FeatureResult {
        let mut doc = self.store.load();
        let profile = active_profile_in(&doc, kind);

        let descriptor = kind.descriptor();
        let mut section = ensure_object(&mut doc, descriptor.profiles_key);
        if let Some(nested) = descriptor.nested_key {
            section = ensure_object(section, nested);
        }
        let entry = ensure_object(section, &profile);
        let features = ensure_object(entry, "features");

        let (changed, result) = action.apply(features, feature, &profile);

        if changed && !self.store.save(&doc) {
            return FeatureResult::write_failed();
        }

        result
    }
}
