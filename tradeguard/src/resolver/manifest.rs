//! Plugin manifests found in user plugin directories
//!
//! A directory location holds `*.json` files. Each file contains one
//! manifest object or an array of them:
//!
//! ```json
//! {
//!     "name": "TightDrawdown",
//!     "capability": "ProtectionRule",
//!     "implements": "MaxDrawdown",
//!     "params": { "max_allowed_drawdown": 0.05 }
//! }
//! ```
//!
//! `implements` names a compiled-in implementation; `params` become default
//! constructor arguments that the caller's configuration can override.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ResolveError;

/// One plugin declared in a manifest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Public plugin name
    pub name: String,
    /// Contract the plugin claims to satisfy
    pub capability: String,
    /// Compiled-in implementation backing the plugin
    pub implements: String,
    /// Default constructor arguments
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Many(Vec<PluginManifest>),
    One(PluginManifest),
}

/// Manifest together with the file it came from.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub manifest: PluginManifest,
    pub source: PathBuf,
}

/// Read every manifest in `dir`, files in name order, entries in file order.
///
/// A missing directory yields nothing; any other failure to inspect it is
/// `ResolveError::Io`. Files that fail to parse are skipped
/// with a warning.
pub fn scan_directory(dir: &Path) -> Result<Vec<ManifestEntry>, ResolveError> {
    let io_err = |source| ResolveError::Io {
        path: dir.to_path_buf(),
        source,
    };

    match fs::metadata(dir) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Plugin directory {} does not exist, skipping", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(io_err(e)),
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();

    let mut entries = Vec::new();
    for file in files {
        match read_manifest_file(&file) {
            Ok(manifests) => entries.extend(manifests.into_iter().map(|manifest| ManifestEntry {
                manifest,
                source: file.clone(),
            })),
            Err(e) => warn!("Skipping plugin manifest {}: {:#}", file.display(), e),
        }
    }
    Ok(entries)
}

fn read_manifest_file(path: &Path) -> anyhow::Result<Vec<PluginManifest>> {
    let raw = fs::read_to_string(path)?;
    let parsed: ManifestFile = serde_json::from_str(&raw)?;
    Ok(match parsed {
        ManifestFile::Many(manifests) => manifests,
        ManifestFile::One(manifest) => vec![manifest],
    })
}
