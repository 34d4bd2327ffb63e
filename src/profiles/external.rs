//! External profile catalogs.
//!
//! A profile type can keep its catalog out of the control document by
//! recording a pointer under its catalog key:
//!
//! ```json
//! {
//!   "liminal_thinking_profiles": {
//!     "external_path": "profiles/liminal_thinking.json"
//!   }
//! }
//! ```
//!
//! The referenced file maps profile names to definitions:
//!
//! ```json
//! {
//!   "focused": { "description": "Narrow scope", "features": { "recall": { "enabled": true } } },
//!   "default": { "description": "", "features": {} }
//! }
//! ```
//!
//! When an external catalog loads non-empty it fully replaces the document
//! catalog for listing and state queries; the document still records which
//! profile is active. Catalogs load lazily and memoize the first successful
//! read for the lifetime of the owning facade.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::profiles::ProfileKind;
use crate::store::{ConfigDoc, get_object};

/// Key inside a catalog section that redirects it to an external file.
pub const EXTERNAL_PATH_KEY: &str = "external_path";

/// Lazily-loaded catalog of profile definitions for one profile type.
#[derive(Debug)]
pub struct ExternalProfileSource {
    path: PathBuf,
    cache: RefCell<Option<ConfigDoc>>,
}

impl ExternalProfileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RefCell::new(None),
        }
    }

    /// Path of the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog, memoizing the first successful read.
    ///
    /// Any failure (missing file, unreadable content, non-object JSON)
    /// yields an empty catalog and is *not* memoized, so a later retry can
    /// pick the file up once it appears.
    pub fn load(&self) -> ConfigDoc {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return cached.clone();
        }

        if !self.path.exists() {
            return ConfigDoc::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Warning: Failed to read {}: {}", self.path.display(), e);
                return ConfigDoc::new();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(catalog)) => {
                *self.cache.borrow_mut() = Some(catalog.clone());
                catalog
            }
            Ok(_) => {
                eprintln!(
                    "Warning: {} is not a JSON object, ignoring external catalog",
                    self.path.display()
                );
                ConfigDoc::new()
            }
            Err(e) => {
                eprintln!("Warning: Failed to parse {}: {}", self.path.display(), e);
                ConfigDoc::new()
            }
        }
    }

    /// Drop the memoized catalog so the next load re-reads the file.
    pub fn invalidate(&self) {
        *self.cache.borrow_mut() = None;
    }
}

/// Scan a control document for catalog sections carrying an external path.
///
/// Relative paths resolve against the control file's directory, so catalogs
/// can travel with the document. Nested types sharing one catalog key (the
/// reasoning family) each get their own source over the same file.
pub fn discover(doc: &ConfigDoc, control_path: &Path) -> HashMap<ProfileKind, ExternalProfileSource> {
    let mut sources = HashMap::new();

    for kind in ProfileKind::ALL {
        let descriptor = kind.descriptor();
        if let Some(section) = get_object(doc, descriptor.profiles_key) {
            if let Some(external) = section.get(EXTERNAL_PATH_KEY).and_then(Value::as_str) {
                let full = resolve_external_path(external, control_path);
                sources.insert(*kind, ExternalProfileSource::new(full));
            }
        }
    }

    sources
}

/// Resolve an `external_path` value to a full catalog path.
pub fn resolve_external_path(external: &str, control_path: &Path) -> PathBuf {
    let path = Path::new(external);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let base = control_path.parent().unwrap_or_else(|| Path::new("."));
    normalize_path(&base.join(path))
}

/// Lexically fold `.` and `..` components (no filesystem access).
fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}
