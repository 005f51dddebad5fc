//! Engine-level configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ProtectionConfig;
use crate::resolver::{PluginArgs, PluginSearchPath};

/// Settings consumed by the resolver and the protection manager.
///
/// Loading and merging configuration files is the caller's job; this type is
/// deserialized from the already-parsed mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root of user-supplied data (`<dir>/protections`, `<dir>/hyperopts`)
    #[serde(default = "default_user_data_dir")]
    pub user_data_dir: PathBuf,
    /// Name of the hyperopt loss function to load
    #[serde(default)]
    pub hyperopt_loss: Option<String>,
    /// Extra directory searched before all others for hyperopt plugins
    #[serde(default)]
    pub hyperopt_path: Option<PathBuf>,
    /// Extra directory searched before all others for protection plugins
    #[serde(default)]
    pub protection_path: Option<PathBuf>,
    /// Candle timeframe (e.g., "5m", "1h")
    #[serde(default, alias = "ticker_interval")]
    pub timeframe: Option<String>,
    /// Minimum trade count an optimization result needs when the loss
    /// function does not set its own
    #[serde(default = "default_min_trades")]
    pub hyperopt_min_trades: usize,
    /// Lock duration in minutes for rules that do not set their own
    #[serde(default = "default_stop_duration")]
    pub stop_duration: u64,
    /// Protection rules, evaluated in this order
    #[serde(default)]
    pub protections: Vec<ProtectionConfig>,
}

fn default_user_data_dir() -> PathBuf {
    PathBuf::from("user_data")
}

fn default_min_trades() -> usize {
    1
}

fn default_stop_duration() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_data_dir: default_user_data_dir(),
            hyperopt_loss: None,
            hyperopt_path: None,
            protection_path: None,
            timeframe: None,
            hyperopt_min_trades: default_min_trades(),
            stop_duration: default_stop_duration(),
            protections: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Search path for protection plugins: `protection_path`, then
    /// `<user_data_dir>/protections`, then the builtin set.
    pub fn protection_search_path(&self) -> PluginSearchPath {
        PluginSearchPath::new(self.user_data_dir.join("protections"))
            .with_override(self.protection_path.clone())
    }

    /// Search path for hyperopt plugins: `hyperopt_path`, then
    /// `<user_data_dir>/hyperopts`, then the builtin set.
    pub fn hyperopt_search_path(&self) -> PluginSearchPath {
        PluginSearchPath::new(self.user_data_dir.join("hyperopts"))
            .with_override(self.hyperopt_path.clone())
    }

    /// Constructor arguments for the hyperopt loss function.
    pub fn hyperopt_loss_args(&self) -> PluginArgs {
        let mut args = PluginArgs::new();
        if let Some(timeframe) = &self.timeframe {
            args.insert("timeframe", timeframe.clone());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::PluginLocation;
    use serde_json::json;

    #[test]
    fn test_defaults_from_empty_mapping() {
        let config: EngineConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.user_data_dir, PathBuf::from("user_data"));
        assert_eq!(config.stop_duration, 60);
        assert_eq!(config.hyperopt_min_trades, 1);
        assert!(config.hyperopt_loss.is_none());
        assert!(config.protections.is_empty());
    }

    #[test]
    fn test_ticker_interval_alias() {
        let config: EngineConfig =
            serde_json::from_value(json!({ "ticker_interval": "1h" })).unwrap();
        assert_eq!(config.timeframe.as_deref(), Some("1h"));
        assert_eq!(config.hyperopt_loss_args().get_str("timeframe"), Some("1h"));
    }

    #[test]
    fn test_hyperopt_search_path_order() {
        let config: EngineConfig = serde_json::from_value(json!({
            "user_data_dir": "/data",
            "hyperopt_path": "/extra"
        }))
        .unwrap();
        let path = config.hyperopt_search_path();
        let locations: Vec<_> = path.iter().cloned().collect();
        assert_eq!(
            locations,
            vec![
                PluginLocation::Directory(PathBuf::from("/extra")),
                PluginLocation::Directory(PathBuf::from("/data/hyperopts")),
                PluginLocation::Builtin,
            ]
        );
    }
}
