//! Ordered plugin search locations

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A place the resolver looks for plugins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginLocation {
    /// Directory scanned for `*.json` plugin manifests
    Directory(PathBuf),
    /// Implementations compiled into this crate
    Builtin,
}

impl PluginLocation {
    /// Directory path, if this is a directory location
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Directory(path) => Some(path),
            Self::Builtin => None,
        }
    }
}

impl fmt::Display for PluginLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "{}", path.display()),
            Self::Builtin => f.write_str("<builtin>"),
        }
    }
}

/// Plugin locations in priority order. The builtin location is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSearchPath {
    locations: Vec<PluginLocation>,
}

impl PluginSearchPath {
    /// `[user_dir, builtin]`
    pub fn new(user_dir: impl Into<PathBuf>) -> Self {
        Self {
            locations: vec![
                PluginLocation::Directory(user_dir.into()),
                PluginLocation::Builtin,
            ],
        }
    }

    /// Builtin location only
    pub fn builtin_only() -> Self {
        Self {
            locations: vec![PluginLocation::Builtin],
        }
    }

    /// Explicit directories followed by the builtin location
    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut locations: Vec<_> = dirs
            .into_iter()
            .map(|dir| PluginLocation::Directory(dir.into()))
            .collect();
        locations.push(PluginLocation::Builtin);
        Self { locations }
    }

    /// Put `dir` in front of every other location
    pub fn with_override(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.locations.insert(0, PluginLocation::Directory(dir));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginLocation> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_last() {
        let path = PluginSearchPath::from_dirs(["a", "b"]).with_override(Some("first".into()));
        let locations: Vec<_> = path.iter().map(ToString::to_string).collect();
        assert_eq!(locations, vec!["first", "a", "b", "<builtin>"]);
    }

    #[test]
    fn test_no_override() {
        let path = PluginSearchPath::new("user_data/protections").with_override(None);
        assert_eq!(path.len(), 2);
        assert_eq!(
            path.iter().next().and_then(PluginLocation::path),
            Some(Path::new("user_data/protections"))
        );
    }
}
