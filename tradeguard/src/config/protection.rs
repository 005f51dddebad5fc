//! Per-rule protection configuration

use anyhow::bail;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resolver::PluginArgs;
use crate::Result;

/// Key under which the engine-wide stop duration is handed to rule factories.
pub const DEFAULT_STOP_DURATION_KEY: &str = "default_stop_duration";

/// Longest accepted lookback or lock, in minutes (ten years).
pub const MAX_WINDOW_MINUTES: u64 = 10 * 365 * 24 * 60;

/// One entry of the `protections` list.
///
/// Only the keys the user actually wrote are forwarded to the rule factory,
/// so a plugin manifest can supply defaults for the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// Plugin name to resolve (e.g., "MaxDrawdown")
    #[serde(default)]
    pub method: Option<String>,
    /// Lookback window in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_period: Option<u64>,
    /// Minimum number of trades before the rule can decide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_limit: Option<usize>,
    /// Lock duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_duration: Option<u64>,
    /// Rule-specific settings (e.g., `max_allowed_drawdown`)
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ProtectionConfig {
    /// Create config for a named rule
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Self::default()
        }
    }

    /// Set lookback window
    pub fn with_lookback_period(mut self, minutes: u64) -> Self {
        self.lookback_period = Some(minutes);
        self
    }

    /// Set trade limit
    pub fn with_trade_limit(mut self, limit: usize) -> Self {
        self.trade_limit = Some(limit);
        self
    }

    /// Set stop duration
    pub fn with_stop_duration(mut self, minutes: u64) -> Self {
        self.stop_duration = Some(minutes);
        self
    }

    /// Set a rule-specific parameter
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Constructor arguments for the rule factory.
    pub fn to_args(&self, default_stop_duration: u64) -> PluginArgs {
        let mut args = PluginArgs::from_map(self.params.clone());
        if let Some(lookback) = self.lookback_period {
            args.insert("lookback_period", lookback);
        }
        if let Some(limit) = self.trade_limit {
            args.insert("trade_limit", limit as u64);
        }
        if let Some(stop) = self.stop_duration {
            args.insert("stop_duration", stop);
        }
        args.insert(DEFAULT_STOP_DURATION_KEY, default_stop_duration);
        args
    }
}

/// Window and lock settings shared by every protection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionParams {
    /// Lookback window in minutes
    pub lookback_period: u64,
    /// Minimum number of trades before a verdict is possible
    pub trade_limit: usize,
    /// Lock duration in minutes
    pub stop_duration: u64,
}

impl ProtectionParams {
    /// Read shared settings, falling back to `default_trade_limit` and the
    /// engine-wide stop duration.
    ///
    /// Values of the wrong type and windows longer than
    /// [`MAX_WINDOW_MINUTES`] are rejected.
    pub fn from_args(args: &PluginArgs, default_trade_limit: usize) -> Result<Self> {
        let default_stop = args.u64_or(DEFAULT_STOP_DURATION_KEY, 60)?;
        let params = Self {
            lookback_period: args.u64_or("lookback_period", 60)?,
            trade_limit: usize::try_from(args.u64_or("trade_limit", default_trade_limit as u64)?)?,
            stop_duration: args.u64_or("stop_duration", default_stop)?,
        };

        for (key, value) in [
            ("lookback_period", params.lookback_period),
            ("stop_duration", params.stop_duration),
        ] {
            if value > MAX_WINDOW_MINUTES {
                bail!(
                    "'{}' of {} minutes exceeds the maximum of {} minutes",
                    key,
                    value,
                    MAX_WINDOW_MINUTES
                );
            }
        }
        Ok(params)
    }
}
