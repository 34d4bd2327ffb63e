//! Profile type definitions.
//!
//! Every axis of configurable behavior is a *profile type*. The set of
//! types is fixed at build time; which profile is active within a type is
//! the runtime-mutable part.
//!
//! | Type id                 | Config key         | Catalog key                 | Nested key    |
//! |-------------------------|--------------------|-----------------------------|---------------|
//! | `workflow`              | `workflow`         | `workflow_profiles`         | -             |
//! | `philosophy`            | `philosophy`       | `philosophy_profiles`       | -             |
//! | `liminal_thinking`      | `liminal_thinking` | `liminal_thinking_profiles` | -             |
//! | `security`              | `security`         | `security_profiles`         | -             |
//! | `reasoning_internal`    | `reasoning`        | `reasoning_profiles`        | `internal`    |
//! | `reasoning_interleaved` | `reasoning`        | `reasoning_profiles`        | `interleaved` |
//! | `reasoning_external`    | `reasoning`        | `reasoning_profiles`        | `external`    |
//!
//! The three reasoning types share one config key and one catalog key but
//! live under distinct nested sub-keys, so they select independently.

use serde::{Deserialize, Serialize};

/// Structural metadata describing where a profile type's data lives inside
/// the control document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileDescriptor {
    /// Top-level key holding the active-profile pointer.
    pub config_key: &'static str,
    /// Top-level key holding the catalog of profiles.
    pub profiles_key: &'static str,
    /// Human-facing name used in messages.
    pub display_name: &'static str,
    /// Sub-key under both `config_key` and `profiles_key` for subdivided types.
    pub nested_key: Option<&'static str>,
    /// Profile assumed active when the document has no pointer.
    pub default_profile: &'static str,
    /// Entry in the `controls` section gating this type's control tool.
    pub control_key: &'static str,
}

/// A registered profile type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Workflow,
    Philosophy,
    LiminalThinking,
    Security,
    ReasoningInternal,
    ReasoningInterleaved,
    ReasoningExternal,
}

impl ProfileKind {
    /// All registered profile types, in registration order.
    pub const ALL: &'static [ProfileKind] = &[
        ProfileKind::Workflow,
        ProfileKind::Philosophy,
        ProfileKind::LiminalThinking,
        ProfileKind::Security,
        ProfileKind::ReasoningInternal,
        ProfileKind::ReasoningInterleaved,
        ProfileKind::ReasoningExternal,
    ];

    /// The type identifier string.
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKind::Workflow => "workflow",
            ProfileKind::Philosophy => "philosophy",
            ProfileKind::LiminalThinking => "liminal_thinking",
            ProfileKind::Security => "security",
            ProfileKind::ReasoningInternal => "reasoning_internal",
            ProfileKind::ReasoningInterleaved => "reasoning_interleaved",
            ProfileKind::ReasoningExternal => "reasoning_external",
        }
    }

    /// Structural metadata for this type.
    pub fn descriptor(self) -> &'static ProfileDescriptor {
        match self {
            ProfileKind::Workflow => &ProfileDescriptor {
                config_key: "workflow",
                profiles_key: "workflow_profiles",
                display_name: "Workflow",
                nested_key: None,
                default_profile: "default",
                control_key: "workflow_control",
            },
            ProfileKind::Philosophy => &ProfileDescriptor {
                config_key: "philosophy",
                profiles_key: "philosophy_profiles",
                display_name: "Philosophy",
                nested_key: None,
                default_profile: "default",
                control_key: "philosophy_control",
            },
            ProfileKind::LiminalThinking => &ProfileDescriptor {
                config_key: "liminal_thinking",
                profiles_key: "liminal_thinking_profiles",
                display_name: "Liminal thinking",
                nested_key: None,
                default_profile: "default",
                control_key: "liminal_thinking_control",
            },
            ProfileKind::Security => &ProfileDescriptor {
                config_key: "security",
                profiles_key: "security_profiles",
                display_name: "Security",
                nested_key: None,
                default_profile: "default",
                control_key: "security_control",
            },
            ProfileKind::ReasoningInternal => &ProfileDescriptor {
                config_key: "reasoning",
                profiles_key: "reasoning_profiles",
                display_name: "Internal reasoning",
                nested_key: Some("internal"),
                default_profile: "default",
                control_key: "reasoning_control",
            },
            ProfileKind::ReasoningInterleaved => &ProfileDescriptor {
                config_key: "reasoning",
                profiles_key: "reasoning_profiles",
                display_name: "Interleaved reasoning",
                nested_key: Some("interleaved"),
                default_profile: "default",
                control_key: "reasoning_control",
            },
            ProfileKind::ReasoningExternal => &ProfileDescriptor {
                config_key: "reasoning",
                profiles_key: "reasoning_profiles",
                display_name: "External reasoning",
                nested_key: Some("external"),
                default_profile: "default",
                control_key: "reasoning_control",
            },
        }
    }

    /// Comma-separated list of valid type identifiers, for error messages.
    pub fn valid_ids() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workflow" => Ok(ProfileKind::Workflow),
            "philosophy" => Ok(ProfileKind::Philosophy),
            "liminal_thinking" => Ok(ProfileKind::LiminalThinking),
            "security" => Ok(ProfileKind::Security),
            "reasoning_internal" => Ok(ProfileKind::ReasoningInternal),
            "reasoning_interleaved" => Ok(ProfileKind::ReasoningInterleaved),
            "reasoning_external" => Ok(ProfileKind::ReasoningExternal),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown profile type: '{}'. Expected one of: {}.",
                s,
                ProfileKind::valid_ids()
            ))),
        }
    }
}
