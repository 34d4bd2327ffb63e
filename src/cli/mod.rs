//! CLI argument definitions for Tiller.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Long version string including build metadata.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("TL_BUILD_TIMESTAMP"),
    ", commit ",
    env!("TL_GIT_COMMIT"),
    ")"
);

/// Tiller - steer AI agent behavior profiles and feature gates.
///
/// All state lives in one JSON control document; every command re-reads it,
/// so external edits take effect immediately.
#[derive(Parser, Debug)]
#[command(name = "tl")]
#[command(author, version, long_version = LONG_VERSION)]
#[command(about = "A CLI tool for steering AI agent behavior profiles and feature gates", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Path to the control document.
    /// Can also be set via TL_CONTROL_FILE environment variable.
    #[arg(short = 'C', long = "control-file", global = true, env = "TL_CONTROL_FILE")]
    pub control_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile selection commands
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Feature gate commands
    Feature {
        #[command(subcommand)]
        command: FeatureCommands,
    },

    /// Control tool gating commands
    Control {
        #[command(subcommand)]
        command: ControlCommands,
    },

    /// Security state: active profile, admin override, per-entry sources
    Status,

    /// Whole-system summary across all profile types
    Summary,

    /// Admin override sentinel state and path
    Override,
}

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the active profile and the available choices
    Get {
        /// Profile type (e.g. security, workflow, reasoning_internal)
        profile_type: String,
    },

    /// Change the active profile
    Set {
        /// Profile type (e.g. security, workflow, reasoning_internal)
        profile_type: String,

        /// Profile name to activate
        name: String,
    },

    /// Show the full state: active profile, available profiles, features
    State {
        /// Profile type (e.g. security, workflow, reasoning_internal)
        profile_type: String,
    },

    /// List the registered profile types
    Types,
}

/// Feature subcommands
#[derive(Subcommand, Debug)]
pub enum FeatureCommands {
    /// Enable a feature in the active profile of a type
    Enable {
        /// Profile type owning the feature
        profile_type: String,

        /// Feature name
        name: String,
    },

    /// Disable a feature in the active profile of a type
    Disable {
        /// Profile type owning the feature
        profile_type: String,

        /// Feature name
        name: String,
    },

    /// Set a global feature/control flag (independent of any profile)
    Set {
        /// Feature name
        name: String,

        /// New state
        state: Toggle,
    },

    /// Resolve a feature's effective state and the source that decided it
    Check {
        /// Feature name
        name: String,
    },

    /// Show a feature's full configuration
    Config {
        /// Feature name
        name: String,
    },

    /// List known features with their resolved status
    List,
}

/// Control subcommands
#[derive(Subcommand, Debug)]
pub enum ControlCommands {
    /// Check a control entry's enabled flag (controls section only)
    Check {
        /// Control name (e.g. workflow_control)
        name: String,
    },
}

/// On/off argument for `feature set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn as_bool(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_toggle_maps_to_bool() {
        assert!(Toggle::On.as_bool());
        assert!(!Toggle::Off.as_bool());
    }
}
