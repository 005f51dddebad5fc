//! Extension resolution
//!
//! Plugins are looked up by name on an ordered [`PluginSearchPath`] and
//! checked against the [`CapabilityContract`] of the interface they are
//! resolved for.

pub mod args;
pub mod capability;
pub mod manifest;
pub mod registry;
pub mod search_path;

pub use args::PluginArgs;
pub use capability::{Capability, CapabilityContract, ContractReport};
pub use manifest::{scan_directory, ManifestEntry, PluginManifest};
pub use registry::{ExtensionResolver, PluginFactory, Resolved};
pub use search_path::{PluginLocation, PluginSearchPath};
