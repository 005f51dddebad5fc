//! Extension resolver - finds and constructs named plugins

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::resolver::manifest::scan_directory;
use crate::resolver::{
    Capability, ContractReport, PluginArgs, PluginLocation, PluginSearchPath,
};

pub type PluginFactory<C> =
    Box<dyn Fn(&PluginArgs) -> anyhow::Result<Box<<C as Capability>::Instance>> + Send + Sync>;

/// A constructed plugin plus what the resolver learned about it.
pub struct Resolved<C: Capability> {
    /// Live plugin instance
    pub instance: Box<C::Instance>,
    /// Name it was resolved under
    pub name: String,
    /// Location that provided it
    pub location: PluginLocation,
    /// Optional operations the caller must supply defaults for
    pub fallbacks: Vec<&'static str>,
}

impl<C: Capability> Resolved<C> {
    /// Whether the caller must fall back for `operation`
    pub fn needs_fallback(&self, operation: &str) -> bool {
        self.fallbacks.iter().any(|op| *op == operation)
    }
}

impl<C: Capability> fmt::Debug for Resolved<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("capability", &C::CONTRACT.name)
            .field("name", &self.name)
            .field("location", &self.location)
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}

/// Candidate found while walking the search path.
struct Candidate {
    implementation: String,
    defaults: Map<String, Value>,
    location: PluginLocation,
}

/// Resolves plugins for one capability.
///
/// Implementations are registered at compile time under the builtin
/// location. Directory locations add named variants of them through
/// manifests.
pub struct ExtensionResolver<C: Capability> {
    factories: BTreeMap<String, PluginFactory<C>>,
}

impl<C: Capability> ExtensionResolver<C> {
    /// Resolver with no implementations registered
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register an implementation factory under `name`
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginArgs) -> anyhow::Result<Box<C::Instance>> + Send + Sync + 'static,
    {
        if self.factories.insert(name.to_string(), Box::new(factory)).is_some() {
            warn!(
                "{} implementation '{}' registered twice, keeping the latest",
                C::CONTRACT.name,
                name
            );
        }
    }

    /// Check if an implementation is registered
    pub fn has_implementation(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered implementation names, sorted
    pub fn available(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Locate `name` on `search_path` and construct it with `args`.
    ///
    /// Locations are visited in order and the first match wins. Every call
    /// builds a new instance.
    pub fn resolve(
        &self,
        name: Option<&str>,
        search_path: &PluginSearchPath,
        args: PluginArgs,
    ) -> Result<Resolved<C>, ResolveError> {
        let contract = &C::CONTRACT;
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(ResolveError::ExtensionNotConfigured {
                    capability: contract.name,
                    setting: contract.setting,
                    hint: contract.hint,
                })
            }
        };

        let mut searched = Vec::with_capacity(search_path.len());
        for location in search_path.iter() {
            searched.push(location.clone());
            if let Some(candidate) = self.find_in(location, name)? {
                return self.construct(name, candidate, args);
            }
        }

        Err(ResolveError::ExtensionNotFound {
            capability: contract.name,
            name: name.to_string(),
            searched,
        })
    }

    fn find_in(
        &self,
        location: &PluginLocation,
        name: &str,
    ) -> Result<Option<Candidate>, ResolveError> {
        match location {
            PluginLocation::Builtin => Ok(self.factories.contains_key(name).then(|| Candidate {
                implementation: name.to_string(),
                defaults: Map::new(),
                location: PluginLocation::Builtin,
            })),
            PluginLocation::Directory(dir) => {
                let found = scan_directory(dir)?.into_iter().find(|entry| {
                    entry.manifest.name == name && entry.manifest.capability == C::CONTRACT.name
                });
                Ok(found.map(|entry| {
                    debug!(
                        "Found {} '{}' in {}",
                        C::CONTRACT.name,
                        name,
                        entry.source.display()
                    );
                    Candidate {
                        implementation: entry.manifest.implements,
                        defaults: entry.manifest.params,
                        location: location.clone(),
                    }
                }))
            }
        }
    }

    fn construct(
        &self,
        name: &str,
        candidate: Candidate,
        args: PluginArgs,
    ) -> Result<Resolved<C>, ResolveError> {
        let contract = &C::CONTRACT;
        let construction_err = |source: anyhow::Error| ResolveError::Construction {
            capability: contract.name,
            name: name.to_string(),
            location: candidate.location.clone(),
            source,
        };

        let factory = self
            .factories
            .get(&candidate.implementation)
            .ok_or_else(|| {
                construction_err(anyhow::anyhow!(
                    "unknown implementation '{}'",
                    candidate.implementation
                ))
            })?;
        let instance = factory(&args.merged_over(&candidate.defaults)).map_err(construction_err)?;

        let report = ContractReport::check(contract, &C::provided_operations(&*instance));
        if !report.is_valid() {
            return Err(ResolveError::InvalidPluginContract {
                capability: contract.name,
                name: name.to_string(),
                missing: report.missing,
            });
        }
        for operation in &report.fallbacks {
            warn!(
                "{} class {} does not provide {}(). Using the default instead.",
                contract.name, name, operation
            );
        }

        info!(
            "Using resolved {} {} from '{}'...",
            contract.name, name, candidate.location
        );
        Ok(Resolved {
            instance,
            name: name.to_string(),
            location: candidate.location,
            fallbacks: report.fallbacks,
        })
    }
}

impl<C: Capability> Default for ExtensionResolver<C> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::CapabilityContract;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;

    trait Greeter: Send + Sync {
        fn greeting(&self) -> String;
        fn volume(&self) -> Option<u64> {
            None
        }
    }

    struct Plain(String);

    impl Greeter for Plain {
        fn greeting(&self) -> String {
            self.0.clone()
        }
    }

    struct Loud(u64);

    impl Greeter for Loud {
        fn greeting(&self) -> String {
            "HELLO".to_string()
        }
        fn volume(&self) -> Option<u64> {
            Some(self.0)
        }
    }

    struct Mute;

    impl Greeter for Mute {
        fn greeting(&self) -> String {
            String::new()
        }
    }

    struct GreeterCapability;

    impl Capability for GreeterCapability {
        type Instance = dyn Greeter;

        const CONTRACT: CapabilityContract = CapabilityContract {
            name: "Greeter",
            setting: "greeter",
            hint: "--greeter",
            required: &["greeting"],
            optional: &["volume"],
        };

        fn provided_operations(instance: &dyn Greeter) -> Vec<&'static str> {
            let mut ops = Vec::new();
            if !instance.greeting().is_empty() {
                ops.push("greeting");
            }
            if instance.volume().is_some() {
                ops.push("volume");
            }
            ops
        }
    }

    fn resolver() -> ExtensionResolver<GreeterCapability> {
        let mut resolver = ExtensionResolver::empty();
        resolver.register("Plain", |args| {
            let text = args.get_str("text").unwrap_or("hello").to_string();
            Ok(Box::new(Plain(text)) as Box<dyn Greeter>)
        });
        resolver.register("Loud", |args| {
            Ok(Box::new(Loud(args.u64_or("volume", 11)?)) as Box<dyn Greeter>)
        });
        resolver.register("Mute", |_| Ok(Box::new(Mute) as Box<dyn Greeter>));
        resolver.register("Broken", |_| Err(anyhow::anyhow!("bad arguments")));
        resolver
    }

    fn manifest(dir: &std::path::Path, file: &str, name: &str, text: &str) {
        let body = json!({
            "name": name,
            "capability": "Greeter",
            "implements": "Plain",
            "params": { "text": text }
        });
        fs::write(dir.join(file), body.to_string()).unwrap();
    }

    #[test]
    fn test_builtin_resolution() {
        let resolved = resolver()
            .resolve(Some("Loud"), &PluginSearchPath::builtin_only(), PluginArgs::new())
            .unwrap();
        assert_eq!(resolved.instance.greeting(), "HELLO");
        assert_eq!(resolved.location, PluginLocation::Builtin);
        assert!(resolved.fallbacks.is_empty());
    }

    #[test]
    fn test_missing_optional_operation_is_reported() {
        let resolved = resolver()
            .resolve(Some("Plain"), &PluginSearchPath::builtin_only(), PluginArgs::new())
            .unwrap();
        assert!(resolved.needs_fallback("volume"));
    }

    #[test]
    fn test_missing_required_operation_is_invalid() {
        let err = resolver()
            .resolve(Some("Mute"), &PluginSearchPath::builtin_only(), PluginArgs::new())
            .unwrap_err();
        match err {
            ResolveError::InvalidPluginContract { name, missing, .. } => {
                assert_eq!(name, "Mute");
                assert_eq!(missing, vec!["greeting"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_name_is_not_configured_before_search() {
        // A file used as a directory fails as soon as it is searched
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = PluginSearchPath::from_dirs([file.path()]);

        for name in [None, Some(""), Some("   ")] {
            let err = resolver().resolve(name, &path, PluginArgs::new()).unwrap_err();
            assert!(matches!(
                err,
                ResolveError::ExtensionNotConfigured { setting: "greeter", .. }
            ));
        }

        let err = resolver()
            .resolve(Some("Plain"), &path, PluginArgs::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }

    #[test]
    fn test_not_found_lists_every_location() {
        let a = tempfile::tempdir().unwrap();
        let path = PluginSearchPath::from_dirs([a.path(), std::path::Path::new("/no/such/dir")]);
        let err = resolver()
            .resolve(Some("Nobody"), &path, PluginArgs::new())
            .unwrap_err();
        match err {
            ResolveError::ExtensionNotFound { name, searched, .. } => {
                assert_eq!(name, "Nobody");
                assert_eq!(
                    searched,
                    vec![
                        PluginLocation::Directory(a.path().to_path_buf()),
                        PluginLocation::Directory(PathBuf::from("/no/such/dir")),
                        PluginLocation::Builtin,
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_location_wins() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        manifest(a.path(), "greeter.json", "Friendly", "from a");
        manifest(b.path(), "greeter.json", "Friendly", "from b");

        let path = PluginSearchPath::from_dirs([a.path(), b.path()]);
        let resolved = resolver()
            .resolve(Some("Friendly"), &path, PluginArgs::new())
            .unwrap();
        assert_eq!(resolved.instance.greeting(), "from a");
        assert_eq!(
            resolved.location,
            PluginLocation::Directory(a.path().to_path_buf())
        );
    }

    #[test]
    fn test_same_name_within_location_takes_first_file() {
        let a = tempfile::tempdir().unwrap();
        manifest(a.path(), "01_first.json", "Friendly", "first");
        manifest(a.path(), "02_second.json", "Friendly", "second");

        let path = PluginSearchPath::from_dirs([a.path()]);
        let resolved = resolver()
            .resolve(Some("Friendly"), &path, PluginArgs::new())
            .unwrap();
        assert_eq!(resolved.instance.greeting(), "first");
    }

    #[test]
    fn test_caller_args_override_manifest_params() {
        let a = tempfile::tempdir().unwrap();
        manifest(a.path(), "greeter.json", "Friendly", "from manifest");

        let mut args = PluginArgs::new();
        args.insert("text", "from config");
        let resolved = resolver()
            .resolve(Some("Friendly"), &PluginSearchPath::from_dirs([a.path()]), args)
            .unwrap();
        assert_eq!(resolved.instance.greeting(), "from config");
    }

    #[test]
    fn test_manifest_for_other_capability_is_ignored() {
        let a = tempfile::tempdir().unwrap();
        let body = json!({ "name": "Plain", "capability": "SomethingElse", "implements": "Loud" });
        fs::write(a.path().join("other.json"), body.to_string()).unwrap();

        let resolved = resolver()
            .resolve(Some("Plain"), &PluginSearchPath::from_dirs([a.path()]), PluginArgs::new())
            .unwrap();
        assert_eq!(resolved.location, PluginLocation::Builtin);
    }

    #[test]
    fn test_unknown_implementation_and_factory_errors() {
        let a = tempfile::tempdir().unwrap();
        let body = json!({ "name": "Ghost", "capability": "Greeter", "implements": "Nope" });
        fs::write(a.path().join("ghost.json"), body.to_string()).unwrap();
        let path = PluginSearchPath::from_dirs([a.path()]);

        let err = resolver()
            .resolve(Some("Ghost"), &path, PluginArgs::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Construction { .. }));
        assert!(err.to_string().contains("unknown implementation 'Nope'"));

        let err = resolver()
            .resolve(Some("Broken"), &path, PluginArgs::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Construction { .. }));
    }

    #[test]
    fn test_each_resolution_is_a_new_instance() {
        let resolver = resolver();
        let path = PluginSearchPath::builtin_only();
        let first = resolver.resolve(Some("Loud"), &path, PluginArgs::new()).unwrap();
        let second = resolver.resolve(Some("Loud"), &path, PluginArgs::new()).unwrap();
        let first_ptr = &*first.instance as *const dyn Greeter as *const u8;
        let second_ptr = &*second.instance as *const dyn Greeter as *const u8;
        // Zero-sized types may share an address; Loud is not zero-sized
        assert_ne!(first_ptr, second_ptr);
    }

    #[test]
    fn test_available_is_sorted() {
        assert_eq!(resolver().available(), vec!["Broken", "Loud", "Mute", "Plain"]);
        assert!(resolver().has_implementation("Loud"));
        assert!(!resolver().has_implementation("loud"));
    }
}
