//! Control document storage.
//!
//! The entire system is driven by one JSON document (the "control file").
//! Reads are tolerant: the document is navigated with defaults at every
//! level, so missing sections, wrong types, and unknown keys never fail a
//! caller. Writes are whole-document and atomic.
//!
//! ## Document layout
//!
//! ```json
//! {
//!   "security": { "active_profile": "open" },
//!   "security_profiles": {
//!     "open": { "features": { "godmode": { "enabled": false, "reference": "godmode.md" } } }
//!   },
//!   "workflow": { "active_profile": "default" },
//!   "workflow_profiles": { "default": { "features": {} } },
//!   "reasoning": { "internal": { "active_profile": "default" } },
//!   "reasoning_profiles": { "internal": { "default": { "features": {} } } },
//!   "features": { "model_overview": { "enabled": true } },
//!   "controls": { "feature_control": { "enabled": true } }
//! }
//! ```
//!
//! There is deliberately no caching: every operation re-reads the file so
//! edits made by other processes (or by hand) take effect immediately.

use serde_json::Value;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable overriding the control file location.
pub const CONTROL_FILE_ENV: &str = "TL_CONTROL_FILE";

/// Environment variable overriding the admin override sentinel location.
pub const OVERRIDE_FILE_ENV: &str = "TL_OVERRIDE_FILE";

/// File name of the admin override sentinel when not overridden.
pub const OVERRIDE_FILE_NAME: &str = "admin_override.lock";

/// The in-memory form of the control document: a plain JSON object tree.
pub type ConfigDoc = serde_json::Map<String, Value>;

/// Borrow a named sub-object of a document section.
///
/// Absent keys and non-object values both read as absent.
pub fn get_object<'a>(doc: &'a ConfigDoc, key: &str) -> Option<&'a ConfigDoc> {
    doc.get(key).and_then(Value::as_object)
}

/// Read an entry's `enabled` flag from a section.
///
/// Returns `None` when the entry itself is absent; an entry without a
/// boolean `enabled` key reads as `Some(false)`.
pub fn entry_enabled(section: &ConfigDoc, name: &str) -> Option<bool> {
    section
        .get(name)
        .map(|entry| entry.get("enabled").and_then(Value::as_bool).unwrap_or(false))
}

/// Borrow a named sub-object mutably, creating it on demand.
///
/// A present non-object value is replaced by an empty object so that write
/// paths always succeed (the mutable mirror of the tolerant read rules).
pub fn ensure_object<'a>(doc: &'a mut ConfigDoc, key: &str) -> &'a mut ConfigDoc {
    if !matches!(doc.get(key), Some(Value::Object(_))) {
        doc.insert(key.to_string(), Value::Object(ConfigDoc::new()));
    }
    if let Some(Value::Object(map)) = doc.get_mut(key) {
        return map;
    }
    unreachable!("key was coerced to an object above")
}

/// Handles all control file I/O plus the admin override sentinel.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    control_path: PathBuf,
    override_path: PathBuf,
}

impl ConfigStore {
    /// Create a store over explicit paths (dependency injection; tests use
    /// this directly).
    pub fn new(control_path: impl Into<PathBuf>, override_path: impl Into<PathBuf>) -> Self {
        Self {
            control_path: control_path.into(),
            override_path: override_path.into(),
        }
    }

    /// Resolve store paths for normal CLI use.
    ///
    /// Control file priority: explicit path (flag) > `TL_CONTROL_FILE` env
    /// var > `<data_dir>/tiller/control.json`.
    ///
    /// Sentinel priority: `TL_OVERRIDE_FILE` env var > `admin_override.lock`
    /// next to the resolved control file.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let control_path = match explicit {
            Some(path) => path,
            None => match env::var(CONTROL_FILE_ENV) {
                Ok(path) if !path.is_empty() => PathBuf::from(path),
                _ => default_control_path()?,
            },
        };

        let override_path = match env::var(OVERRIDE_FILE_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => control_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(OVERRIDE_FILE_NAME),
        };

        Ok(Self::new(control_path, override_path))
    }

    /// Path of the control file.
    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    /// Path of the admin override sentinel.
    pub fn override_path(&self) -> &Path {
        &self.override_path
    }

    /// Load the control document from disk (always fresh, no caching).
    ///
    /// Never fails: a missing file yields the built-in default document,
    /// and unreadable or unparseable content degrades to the same default
    /// with a warning on stderr.
    pub fn load(&self) -> ConfigDoc {
        if !self.control_path.exists() {
            return default_document();
        }

        let content = match fs::read_to_string(&self.control_path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to read {}: {}",
                    self.control_path.display(),
                    e
                );
                return default_document();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(doc)) => doc,
            Ok(_) => {
                eprintln!(
                    "Warning: {} is not a JSON object, using defaults",
                    self.control_path.display()
                );
                default_document()
            }
            Err(e) => {
                eprintln!(
                    "Warning: Failed to parse {}: {}",
                    self.control_path.display(),
                    e
                );
                default_document()
            }
        }
    }

    /// Persist the control document.
    ///
    /// Writes through a temp file in the target directory and renames over
    /// the destination, so readers never observe a partial document.
    /// Returns false (with a warning on stderr) instead of failing.
    pub fn save(&self, doc: &ConfigDoc) -> bool {
        match self.try_save(doc) {
            Ok(()) => true,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to write {}: {}",
                    self.control_path.display(),
                    e
                );
                false
            }
        }
    }

    fn try_save(&self, doc: &ConfigDoc) -> Result<()> {
        let dir = self
            .control_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(&Value::Object(doc.clone()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&self.control_path)
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Whether the admin override sentinel exists.
    ///
    /// Checked fresh on every call; only existence matters, the content is
    /// never read.
    pub fn has_admin_override(&self) -> bool {
        self.override_path.exists()
    }
}

/// Default location of the control file.
pub fn default_control_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("tiller").join("control.json"))
}

/// The built-in document used whenever the control file cannot be read.
///
/// Guarantees the rest of the engine never observes "no configuration":
/// the open security profile is active and every gating control is enabled.
pub fn default_document() -> ConfigDoc {
    let doc = serde_json::json!({
        "security": { "active_profile": "open" },
        "security_profiles": { "open": { "features": {} } },
        "features": {
            "godmode": { "enabled": false },
            "plinian_cognitive_matrix": { "enabled": false },
            "model_overview": { "enabled": true }
        },
        "controls": {
            "security_control": { "enabled": true },
            "feature_control": { "enabled": true },
            "workflow_control": { "enabled": true },
            "philosophy_control": { "enabled": true },
            "liminal_thinking_control": { "enabled": true },
            "reasoning_control": { "enabled": true }
        }
    });

    match doc {
        Value::Object(map) => map,
        _ => ConfigDoc::new(),
    }
}
