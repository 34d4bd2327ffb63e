//! Feature enablement resolution.
//!
//! A feature's effective state is resolved through an ordered chain of
//! configuration sources, first match wins:
//!
//! 1. Global `features` section (explicit opt-in/out, profile-independent)
//! 2. Global `controls` section (tool-gating flags)
//! 3. The active *security* profile's feature map
//! 4. Nothing found: disabled (fail-closed)
//!
//! The admin override sentinel flips exactly one case: a decision won by
//! the security profile is forced enabled and attributed to the override.
//! Decisions won by the global sections are never overridden; the override
//! exists to bypass security-profile lockdown, not to blanket-enable.

use serde::Serialize;
use serde_json::Value;

use crate::store::{ConfigDoc, entry_enabled, get_object};

/// Which configuration source decided a feature's enabled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSource {
    /// Global `features` section
    Features,
    /// Global `controls` section
    Controls,
    /// Active security profile's feature map
    SecurityProfile,
    /// Admin override forcing a security-profile decision to enabled
    AdminOverride,
    /// Not defined anywhere (fail-closed)
    NotFound,
}

impl FeatureSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureSource::Features => "features",
            FeatureSource::Controls => "controls",
            FeatureSource::SecurityProfile => "security_profile",
            FeatureSource::AdminOverride => "admin_override",
            FeatureSource::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for FeatureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved enabled flag with the source that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureDecision {
    pub enabled: bool,
    pub source: FeatureSource,
}

impl FeatureDecision {
    fn new(enabled: bool, source: FeatureSource) -> Self {
        Self { enabled, source }
    }
}

/// Resolve a feature's effective state against a loaded document.
///
/// `security_profile` is the currently active security profile name and
/// `admin_override` the sentinel state, both read by the caller so one
/// load serves a whole batch of resolutions.
pub fn resolve_feature(
    doc: &ConfigDoc,
    security_profile: &str,
    admin_override: bool,
    name: &str,
) -> FeatureDecision {
    let mut decision = FeatureDecision::new(false, FeatureSource::NotFound);

    if let Some(enabled) = get_object(doc, "features").and_then(|s| entry_enabled(s, name)) {
        decision = FeatureDecision::new(enabled, FeatureSource::Features);
    } else if let Some(enabled) = get_object(doc, "controls").and_then(|s| entry_enabled(s, name)) {
        decision = FeatureDecision::new(enabled, FeatureSource::Controls);
    } else if let Some(enabled) =
        security_profile_features(doc, security_profile).and_then(|s| entry_enabled(s, name))
    {
        decision = FeatureDecision::new(enabled, FeatureSource::SecurityProfile);
    }

    if admin_override && decision.source == FeatureSource::SecurityProfile {
        decision = FeatureDecision::new(true, FeatureSource::AdminOverride);
    }

    decision
}

/// Borrow the feature map of a named security profile, if defined.
pub fn security_profile_features<'a>(doc: &'a ConfigDoc, profile: &str) -> Option<&'a ConfigDoc> {
    get_object(doc, "security_profiles")
        .and_then(|profiles| get_object(profiles, profile))
        .and_then(|entry| get_object(entry, "features"))
}

/// Names with `enabled=true` across the global sections and the active
/// security profile's feature map, global entries first.
pub fn enabled_features(doc: &ConfigDoc, security_profile: &str) -> Vec<String> {
    let mut enabled = Vec::new();

    for section in ["features", "controls"] {
        if let Some(map) = get_object(doc, section) {
            for name in map.keys() {
                if entry_enabled(map, name) == Some(true) {
                    enabled.push(name.clone());
                }
            }
        }
    }

    if let Some(map) = security_profile_features(doc, security_profile) {
        for name in map.keys() {
            if entry_enabled(map, name) == Some(true) {
                enabled.push(name.clone());
            }
        }
    }

    enabled
}

/// Sorted union of the `features` and `controls` section keys.
pub fn available_features(doc: &ConfigDoc) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for section in ["features", "controls"] {
        if let Some(map) = get_object(doc, section) {
            names.extend(map.keys().cloned());
        }
    }
    names.sort();
    names.dedup();
    names
}

/// Read a control entry's enabled flag from the `controls` section only.
///
/// Absent entries read as disabled; the precedence chain and the admin
/// override do not apply to this lookup.
pub fn control_enabled(doc: &ConfigDoc, name: &str) -> bool {
    get_object(doc, "controls")
        .and_then(|s| entry_enabled(s, name))
        .unwrap_or(false)
}

/// Full configuration of a feature, looked up for content rather than
/// gating: the active security profile's entry wins over the global
/// sections, the inverse of the enablement chain.
pub fn feature_config(doc: &ConfigDoc, security_profile: &str, name: &str) -> Option<ConfigDoc> {
    let lookup = |section: Option<&ConfigDoc>| {
        section
            .and_then(|s| s.get(name))
            .and_then(Value::as_object)
            .cloned()
    };

    lookup(security_profile_features(doc, security_profile))
        .or_else(|| lookup(get_object(doc, "features")))
        .or_else(|| lookup(get_object(doc, "controls")))
}
