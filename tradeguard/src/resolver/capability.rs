//! Capability contracts a resolved plugin must satisfy

/// Declarative description of a plugin interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityContract {
    /// Interface name plugins declare in their manifests
    pub name: &'static str,
    /// Configuration key holding the plugin name
    pub setting: &'static str,
    /// Operator guidance when the setting is missing
    pub hint: &'static str,
    /// Operations an instance must provide
    pub required: &'static [&'static str],
    /// Operations with a caller-side fallback
    pub optional: &'static [&'static str],
}

/// Binds a contract to the trait object type resolved for it.
pub trait Capability: 'static {
    /// Resolved instance type, e.g. `dyn ProtectionRule`
    type Instance: ?Sized + Send + Sync;

    /// Contract checked after construction
    const CONTRACT: CapabilityContract;

    /// Operations this particular instance provides
    fn provided_operations(instance: &Self::Instance) -> Vec<&'static str>;
}

/// Result of checking an instance against its contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractReport {
    /// Required operations not provided
    pub missing: Vec<&'static str>,
    /// Optional operations not provided
    pub fallbacks: Vec<&'static str>,
}

impl ContractReport {
    pub fn check(contract: &CapabilityContract, provided: &[&'static str]) -> Self {
        let absent = |ops: &[&'static str]| {
            ops.iter()
                .copied()
                .filter(|op| !provided.contains(op))
                .collect::<Vec<_>>()
        };
        Self {
            missing: absent(contract.required),
            fallbacks: absent(contract.optional),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: CapabilityContract = CapabilityContract {
        name: "Example",
        setting: "example",
        hint: "--example",
        required: &["run"],
        optional: &["describe", "warmup"],
    };

    #[test]
    fn test_report_splits_missing_and_fallbacks() {
        let report = ContractReport::check(&CONTRACT, &["describe"]);
        assert_eq!(report.missing, vec!["run"]);
        assert_eq!(report.fallbacks, vec!["warmup"]);
        assert!(!report.is_valid());

        let report = ContractReport::check(&CONTRACT, &["run", "describe", "warmup"]);
        assert!(report.is_valid());
        assert!(report.fallbacks.is_empty());
    }
}
