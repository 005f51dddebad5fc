//! Startup errors raised while resolving plugins.
//!
//! All of these abort the configured run. Failures inside a protection rule
//! during evaluation are not represented here; the protection manager logs
//! and isolates them.

use std::path::PathBuf;

use thiserror::Error;

use crate::resolver::PluginLocation;

/// Errors produced by [`crate::resolver::ExtensionResolver`].
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The configuration does not name a plugin for this capability.
    #[error("No {capability} set. Please use `{hint}` to specify the {capability} class to use (setting `{setting}`).")]
    ExtensionNotConfigured {
        /// Contract name, e.g. `HyperOptLoss`.
        capability: &'static str,
        /// Configuration key that should hold the plugin name.
        setting: &'static str,
        /// Operator guidance.
        hint: &'static str,
    },

    /// No location on the search path provides the plugin.
    #[error("Impossible to load {capability} '{name}'. This class does not exist in any of: {}", display_locations(.searched))]
    ExtensionNotFound {
        /// Contract name.
        capability: &'static str,
        /// Requested plugin name.
        name: String,
        /// Every location visited, in search order.
        searched: Vec<PluginLocation>,
    },

    /// The constructed plugin does not provide a required operation.
    #[error("Found {capability} {name} does not implement {}", .missing.join(", "))]
    InvalidPluginContract {
        /// Contract name.
        capability: &'static str,
        /// Requested plugin name.
        name: String,
        /// Required operations the instance lacks.
        missing: Vec<&'static str>,
    },

    /// The factory rejected its constructor arguments.
    #[error("Failed to construct {capability} '{name}' from {location}: {source}")]
    Construction {
        /// Contract name.
        capability: &'static str,
        /// Requested plugin name.
        name: String,
        /// Location the plugin was found in.
        location: PluginLocation,
        /// Underlying factory error.
        #[source]
        source: anyhow::Error,
    },

    /// A plugin location exists but cannot be enumerated.
    #[error("Cannot search plugin location {}: {source}", .path.display())]
    Io {
        /// Offending location.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Name of the plugin the error refers to, if any.
    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            Self::ExtensionNotFound { name, .. }
            | Self::InvalidPluginContract { name, .. }
            | Self::Construction { name, .. } => Some(name),
            Self::ExtensionNotConfigured { .. } | Self::Io { .. } => None,
        }
    }
}

fn display_locations(locations: &[PluginLocation]) -> String {
    locations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
