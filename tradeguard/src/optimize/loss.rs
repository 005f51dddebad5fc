//! Objective function interface and loading

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::EngineConfig;
use crate::data::TradeRecord;
use crate::error::ResolveError;
use crate::resolver::{Capability, CapabilityContract, ExtensionResolver, PluginArgs};
use crate::Result;

/// Scores the trades of one optimization epoch.
pub trait ObjectiveFunction: Send + Sync {
    /// Implementation name
    fn name(&self) -> &str;

    /// Candle timeframe the loss was built for
    fn timeframe(&self) -> &str;

    /// Loss for `results`; smaller is better
    fn hyperopt_loss_function(
        &self,
        results: &[TradeRecord],
        trade_count: usize,
        min_date: DateTime<Utc>,
        max_date: DateTime<Utc>,
    ) -> f64;

    /// Minimum trade count for a result to be considered.
    ///
    /// `None` means the optimizer's `hyperopt_min_trades` applies.
    fn min_trades(&self) -> Option<usize> {
        None
    }
}

/// Contract binding for [`ObjectiveFunction`] plugins.
pub struct ObjectiveCapability;

impl Capability for ObjectiveCapability {
    type Instance = dyn ObjectiveFunction;

    const CONTRACT: CapabilityContract = CapabilityContract {
        name: "HyperOptLoss",
        setting: "hyperopt_loss",
        hint: "--hyperopt-loss",
        required: &["hyperopt_loss_function"],
        optional: &["min_trades"],
    };

    fn provided_operations(loss: &dyn ObjectiveFunction) -> Vec<&'static str> {
        let mut ops = vec!["hyperopt_loss_function"];
        if loss.min_trades().is_some() {
            ops.push("min_trades");
        }
        ops
    }
}

/// Loss function ready for the optimizer
pub struct LoadedLoss {
    pub loss: Box<dyn ObjectiveFunction>,
    /// Name it was configured under
    pub name: String,
    /// Effective minimum trade count
    pub min_trades: usize,
}

impl LoadedLoss {
    /// Score `results` with the wrapped loss
    pub fn score(&self, results: &[TradeRecord], min_date: DateTime<Utc>, max_date: DateTime<Utc>) -> f64 {
        self.loss
            .hyperopt_loss_function(results, results.len(), min_date, max_date)
    }
}

/// Resolve `config.hyperopt_loss` on the hyperopt search path.
///
/// The configured timeframe is passed to the constructor; a loss without its
/// own `min_trades` gets `config.hyperopt_min_trades`.
pub fn load_hyperopt_loss(
    config: &EngineConfig,
    resolver: &ExtensionResolver<ObjectiveCapability>,
) -> std::result::Result<LoadedLoss, ResolveError> {
    let resolved = resolver.resolve(
        config.hyperopt_loss.as_deref(),
        &config.hyperopt_search_path(),
        config.hyperopt_loss_args(),
    )?;

    let min_trades = resolved
        .instance
        .min_trades()
        .unwrap_or(config.hyperopt_min_trades);
    info!(
        "Hyperopt loss {} loaded for timeframe {} (min trades: {})",
        resolved.name,
        resolved.instance.timeframe(),
        min_trades
    );

    Ok(LoadedLoss {
        loss: resolved.instance,
        name: resolved.name,
        min_trades,
    })
}

/// Constructor arguments every builtin loss understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossSettings {
    /// Candle timeframe, always injected from the configuration
    pub timeframe: String,
    /// Per-variant minimum trade count, usually set from a manifest
    pub min_trades: Option<usize>,
}

impl LossSettings {
    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        let timeframe = args
            .get_str("timeframe")
            .filter(|tf| !tf.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument 'timeframe'"))?;
        let min_trades = match args.get("min_trades") {
            None => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .ok_or_else(|| anyhow::anyhow!("'min_trades' must be a non-negative integer"))?
                    as usize,
            ),
        };
        Ok(Self {
            timeframe: timeframe.to_string(),
            min_trades,
        })
    }
}

/// Sum of profit ratios
pub(crate) fn total_profit(results: &[TradeRecord]) -> f64 {
    results.iter().map(|t| t.profit_ratio()).sum()
}
