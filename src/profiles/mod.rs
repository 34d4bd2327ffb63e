//! Profile types, catalogs, and the generic profile manager.
//!
//! One manager implements every profile operation for every registered
//! type; the per-type structure (document keys, nesting, defaults) comes
//! from the [`ProfileKind`] descriptor table.
//!
//! Catalog resolution order for listing and state queries:
//!
//! 1. External catalog file, when the type's catalog section names one and
//!    the file loads non-empty (full replacement).
//! 2. The catalog embedded in the control document.
//!
//! The active-profile pointer always lives in the control document, even
//! for externally-cataloged types. A pointer naming a profile that no
//! catalog defines is reported as-is with an empty feature map; nothing
//! silently falls back.

pub mod definitions;
pub mod external;

pub use definitions::{ProfileDescriptor, ProfileKind};
pub use external::ExternalProfileSource;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::store::{ConfigDoc, ConfigStore, ensure_object, get_object};

/// Read the active profile name for a type from a loaded document.
pub fn active_profile_in(doc: &ConfigDoc, kind: ProfileKind) -> String {
    let descriptor = kind.descriptor();
    let mut section = get_object(doc, descriptor.config_key);
    if let Some(nested) = descriptor.nested_key {
        section = section.and_then(|s| get_object(s, nested));
    }
    section
        .and_then(|s| s.get("active_profile"))
        .and_then(Value::as_str)
        .unwrap_or(descriptor.default_profile)
        .to_string()
}

/// Borrow a type's embedded catalog from a loaded document.
pub fn catalog_in(doc: &ConfigDoc, kind: ProfileKind) -> Option<&ConfigDoc> {
    let descriptor = kind.descriptor();
    let section = get_object(doc, descriptor.profiles_key)?;
    match descriptor.nested_key {
        Some(nested) => get_object(section, nested),
        None => Some(section),
    }
}

/// A profile control request, decoded once at the CLI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    /// Report the active profile and the available choices.
    GetProfile,
    /// Report the full state (active, available, features).
    GetState,
    /// Change the active profile.
    SetProfile { profile: String },
}

/// Result record for a set-active request.
///
/// A no-op success (already on the requested profile) carries `profile`
/// but neither `previous_profile` nor `new_profile`, so callers can render
/// it differently from an actual change.
#[derive(Debug, Clone, Serialize)]
pub struct SetProfileResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_profile: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available_profiles: Vec<String>,
}

impl SetProfileResult {
    fn base() -> Self {
        Self {
            success: true,
            error: None,
            message: None,
            profile: None,
            previous_profile: None,
            new_profile: None,
            available_profiles: Vec::new(),
        }
    }

    fn changed(kind: ProfileKind, previous: String, new: String) -> Self {
        let display = kind.descriptor().display_name;
        Self {
            message: Some(format!(
                "{} profile changed from '{}' to '{}'",
                display, previous, new
            )),
            previous_profile: Some(previous),
            new_profile: Some(new),
            ..Self::base()
        }
    }

    fn already_active(kind: ProfileKind, profile: &str) -> Self {
        let display = kind.descriptor().display_name.to_lowercase();
        Self {
            message: Some(format!("Already on {} profile '{}'", display, profile)),
            profile: Some(profile.to_string()),
            ..Self::base()
        }
    }

    fn not_found(kind: ProfileKind, profile: &str, available: Vec<String>) -> Self {
        Self {
            success: false,
            error: Some(format!(
                "{} profile '{}' not found",
                kind.descriptor().display_name,
                profile
            )),
            available_profiles: available,
            ..Self::base()
        }
    }

    fn write_failed() -> Self {
        Self {
            success: false,
            error: Some("Failed to write configuration".to_string()),
            ..Self::base()
        }
    }
}

/// Full state of one profile type.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileState {
    pub active_profile: String,
    pub available_profiles: Vec<String>,
    pub features: ConfigDoc,
    /// Only present when the state came from an external catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Generic profile operations, parameterized by [`ProfileKind`].
pub struct ProfileManager<'a> {
    store: &'a ConfigStore,
    externals: &'a HashMap<ProfileKind, ExternalProfileSource>,
}

impl<'a> ProfileManager<'a> {
    pub fn new(
        store: &'a ConfigStore,
        externals: &'a HashMap<ProfileKind, ExternalProfileSource>,
    ) -> Self {
        Self { store, externals }
    }

    /// A type's external catalog, when one is registered and loads non-empty.
    fn external_catalog(&self, kind: ProfileKind) -> Option<ConfigDoc> {
        let catalog = self.externals.get(&kind)?.load();
        if catalog.is_empty() { None } else { Some(catalog) }
    }

    /// Active profile name for a type (descriptor default when unset).
    pub fn get_active(&self, kind: ProfileKind) -> String {
        active_profile_in(&self.store.load(), kind)
    }

    /// Available profile names for a type, external catalog first.
    pub fn get_available(&self, kind: ProfileKind) -> Vec<String> {
        if let Some(catalog) = self.external_catalog(kind) {
            return catalog.keys().cloned().collect();
        }

        let doc = self.store.load();
        match catalog_in(&doc, kind) {
            Some(catalog) => catalog.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Change the active profile for a type.
    ///
    /// Validates against [`Self::get_available`] before anything else, so a
    /// request naming the current-but-no-longer-cataloged profile reports
    /// not-found rather than a no-op.
    pub fn set_active(&self, kind: ProfileKind, profile: &str) -> SetProfileResult {
        let mut doc = self.store.load();

        let available = self.get_available(kind);
        if !available.iter().any(|name| name == profile) {
            return SetProfileResult::not_found(kind, profile, available);
        }

        let previous = active_profile_in(&doc, kind);
        if previous == profile {
            return SetProfileResult::already_active(kind, profile);
        }

        let descriptor = kind.descriptor();
        let mut section = ensure_object(&mut doc, descriptor.config_key);
        if let Some(nested) = descriptor.nested_key {
            section = ensure_object(section, nested);
        }
        section.insert(
            "active_profile".to_string(),
            Value::String(profile.to_string()),
        );

        if !self.store.save(&doc) {
            return SetProfileResult::write_failed();
        }

        SetProfileResult::changed(kind, previous, profile.to_string())
    }

    /// Full state for a type.
    ///
    /// The external catalog wins when it defines the active profile; its
    /// entry also supplies the description. Otherwise features come from
    /// the document catalog, and a dangling active pointer yields an empty
    /// feature map.
    pub fn get_state(&self, kind: ProfileKind) -> ProfileState {
        let doc = self.store.load();
        let active = active_profile_in(&doc, kind);

        if let Some(catalog) = self.external_catalog(kind) {
            if let Some(entry) = catalog.get(&active) {
                return ProfileState {
                    available_profiles: catalog.keys().cloned().collect(),
                    features: entry
                        .get("features")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                    description: Some(
                        entry
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .to_string(),
                    ),
                    active_profile: active,
                };
            }
        }

        let features = catalog_in(&doc, kind)
            .and_then(|catalog| get_object(catalog, &active))
            .and_then(|profile| get_object(profile, "features"))
            .cloned()
            .unwrap_or_default();

        ProfileState {
            available_profiles: self.get_available(kind),
            features,
            description: None,
            active_profile: active,
        }
    }
}
