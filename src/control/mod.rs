//! The system control facade.
//!
//! [`SystemControl`] is the single entry point callers use: profile
//! selection, per-profile feature toggles, global feature options, the
//! enablement precedence chain, and admin override inspection. It owns the
//! [`ConfigStore`] and the external catalog sources discovered from the
//! document at construction; everything else is recomputed per call from a
//! fresh load, so external edits to the control file take effect without
//! restarting.

pub mod resolver;

pub use resolver::{FeatureDecision, FeatureSource};

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::features::{FeatureAction, FeatureManager, FeatureResult};
use crate::profiles::{
    ExternalProfileSource, ProfileAction, ProfileKind, ProfileManager, ProfileState,
    SetProfileResult, external,
};
use crate::store::{ConfigDoc, ConfigStore, ensure_object, entry_enabled};

/// Result record for a global feature option write.
///
/// Unlike profile changes, a same-value call still reports both values;
/// the `message` is what distinguishes it from an actual change.
#[derive(Debug, Clone, Serialize)]
pub struct SetFeatureOptionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Per-entry resolution report, the observability surface for "enabled via
/// policy X" diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityState {
    pub active_profile: String,
    pub available_profiles: Vec<String>,
    pub admin_override: bool,
    /// Every known feature/control name with its resolved state and the
    /// source that won the precedence chain.
    pub entries: std::collections::BTreeMap<String, FeatureDecision>,
}

/// Whole-system snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    pub profiles: std::collections::BTreeMap<String, Value>,
    pub enabled_features: Vec<String>,
    pub available_features: Vec<String>,
    pub admin_override: bool,
}

/// Facade over the store, the profile registry, and both managers.
pub struct SystemControl {
    store: ConfigStore,
    externals: HashMap<ProfileKind, ExternalProfileSource>,
}

impl SystemControl {
    /// Build a facade over an injected store, discovering external catalog
    /// sources from the current document.
    pub fn new(store: ConfigStore) -> Self {
        let externals = external::discover(&store.load(), store.control_path());
        Self { store, externals }
    }

    /// The underlying store (paths, sentinel checks).
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn profiles(&self) -> ProfileManager<'_> {
        ProfileManager::new(&self.store, &self.externals)
    }

    // ========================================================================
    // Profile operations
    // ========================================================================

    pub fn get_active_profile(&self, kind: ProfileKind) -> String {
        self.profiles().get_active(kind)
    }

    pub fn get_available_profiles(&self, kind: ProfileKind) -> Vec<String> {
        self.profiles().get_available(kind)
    }

    pub fn set_active_profile(&self, kind: ProfileKind, profile: &str) -> SetProfileResult {
        self.profiles().set_active(kind, profile)
    }

    pub fn get_state(&self, kind: ProfileKind) -> ProfileState {
        self.profiles().get_state(kind)
    }

    /// Run a decoded profile request, serializing the matching record.
    pub fn apply_profile_action(&self, kind: ProfileKind, action: &ProfileAction) -> Value {
        match action {
            ProfileAction::GetProfile => serde_json::json!({
                "profile_type": kind.as_str(),
                "active_profile": self.get_active_profile(kind),
                "available_profiles": self.get_available_profiles(kind),
            }),
            ProfileAction::GetState => {
                serde_json::to_value(self.get_state(kind)).unwrap_or(Value::Null)
            }
            ProfileAction::SetProfile { profile } => {
                serde_json::to_value(self.set_active_profile(kind, profile)).unwrap_or(Value::Null)
            }
        }
    }

    /// Drop a type's memoized external catalog so the next query re-reads it.
    pub fn invalidate_external(&self, kind: ProfileKind) {
        if let Some(source) = self.externals.get(&kind) {
            source.invalidate();
        }
    }

    // ========================================================================
    // Feature operations
    // ========================================================================

    pub fn enable_feature(&self, kind: ProfileKind, feature: &str) -> FeatureResult {
        FeatureManager::new(&self.store).modify_feature(kind, feature, FeatureAction::Enable)
    }

    pub fn disable_feature(&self, kind: ProfileKind, feature: &str) -> FeatureResult {
        FeatureManager::new(&self.store).modify_feature(kind, feature, FeatureAction::Disable)
    }

    /// Write a global feature/control flag.
    ///
    /// The entry is updated in whichever global section already defines it
    /// (`features` first, then `controls`); an unknown name is created under
    /// `features`. The active security profile can still shadow the result
    /// for names it defines, which the success record's note points out.
    pub fn set_feature_option(&self, feature: &str, enabled: bool) -> SetFeatureOptionResult {
        let mut doc = self.store.load();

        let section = if entry_enabled(&doc_section(&doc, "features"), feature).is_some() {
            "features"
        } else if entry_enabled(&doc_section(&doc, "controls"), feature).is_some() {
            "controls"
        } else {
            "features"
        };

        let map = ensure_object(&mut doc, section);
        let previous = entry_enabled(map, feature).unwrap_or(false);
        let verb = if enabled { "enabled" } else { "disabled" };

        if previous == enabled {
            return SetFeatureOptionResult {
                success: true,
                error: None,
                message: Some(format!("Feature '{}' already {}", feature, verb)),
                feature: Some(feature.to_string()),
                previous_value: Some(previous),
                new_value: Some(enabled),
                note: None,
            };
        }

        ensure_object(map, feature).insert("enabled".to_string(), Value::Bool(enabled));

        if !self.store.save(&doc) {
            return SetFeatureOptionResult {
                success: false,
                error: Some("Failed to write configuration".to_string()),
                message: None,
                feature: None,
                previous_value: None,
                new_value: None,
                note: None,
            };
        }

        SetFeatureOptionResult {
            success: true,
            error: None,
            message: Some(format!("Feature '{}' {}", feature, verb)),
            feature: Some(feature.to_string()),
            previous_value: Some(previous),
            new_value: Some(enabled),
            note: Some("Active security profile may still override this setting".to_string()),
        }
    }

    // ========================================================================
    // Enablement queries
    // ========================================================================

    /// Resolve a feature through the precedence chain, reporting the source.
    pub fn resolve_feature(&self, name: &str) -> FeatureDecision {
        let doc = self.store.load();
        let profile = crate::profiles::active_profile_in(&doc, ProfileKind::Security);
        resolver::resolve_feature(&doc, &profile, self.store.has_admin_override(), name)
    }

    /// Boolean projection of [`Self::resolve_feature`].
    pub fn is_feature_enabled(&self, name: &str) -> bool {
        self.resolve_feature(name).enabled
    }

    /// Control-section enablement, used to gate the control tools
    /// themselves. Absent entries are disabled; the precedence chain does
    /// not apply.
    pub fn is_control_enabled(&self, name: &str) -> bool {
        resolver::control_enabled(&self.store.load(), name)
    }

    pub fn is_admin_override_active(&self) -> bool {
        self.store.has_admin_override()
    }

    /// Full feature configuration, profile entry first (content lookup,
    /// not gating).
    pub fn get_feature_config(&self, name: &str) -> Option<ConfigDoc> {
        let doc = self.store.load();
        let profile = crate::profiles::active_profile_in(&doc, ProfileKind::Security);
        resolver::feature_config(&doc, &profile, name)
    }

    pub fn get_available_features(&self) -> Vec<String> {
        resolver::available_features(&self.store.load())
    }

    pub fn get_enabled_features(&self) -> Vec<String> {
        let doc = self.store.load();
        let profile = crate::profiles::active_profile_in(&doc, ProfileKind::Security);
        resolver::enabled_features(&doc, &profile)
    }

    // ========================================================================
    // Aggregate state
    // ========================================================================

    /// Resolved state and winning source for every known feature/control
    /// name, plus the security profile and override status.
    pub fn get_security_state(&self) -> SecurityState {
        let doc = self.store.load();
        let admin_override = self.store.has_admin_override();
        let profile = crate::profiles::active_profile_in(&doc, ProfileKind::Security);

        let entries = resolver::available_features(&doc)
            .into_iter()
            .map(|name| {
                let decision = resolver::resolve_feature(&doc, &profile, admin_override, &name);
                (name, decision)
            })
            .collect();

        SecurityState {
            available_profiles: self.get_available_profiles(ProfileKind::Security),
            active_profile: profile,
            admin_override,
            entries,
        }
    }

    /// Per-type state for every registered profile type; the security type
    /// maps to its resolution report rather than the plain profile state.
    pub fn get_all_profiles_state(&self) -> std::collections::BTreeMap<String, Value> {
        ProfileKind::ALL
            .iter()
            .map(|kind| {
                let state = if *kind == ProfileKind::Security {
                    serde_json::to_value(self.get_security_state())
                } else {
                    serde_json::to_value(self.get_state(*kind))
                };
                (kind.as_str().to_string(), state.unwrap_or(Value::Null))
            })
            .collect()
    }

    pub fn get_system_summary(&self) -> SystemSummary {
        SystemSummary {
            profiles: self.get_all_profiles_state(),
            enabled_features: self.get_enabled_features(),
            available_features: self.get_available_features(),
            admin_override: self.store.has_admin_override(),
        }
    }
}

/// Borrow a top-level section, empty when absent.
fn doc_section(doc: &ConfigDoc, key: &str) -> ConfigDoc {
    crate::store::get_object(doc, key).cloned().unwrap_or_default()
}
