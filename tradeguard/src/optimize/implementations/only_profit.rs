//! Profit-only loss

use chrono::{DateTime, Utc};

use crate::data::TradeRecord;
use crate::optimize::implementations::EXPECTED_MAX_PROFIT;
use crate::optimize::loss::total_profit;
use crate::optimize::{LossSettings, ObjectiveFunction};
use crate::resolver::PluginArgs;
use crate::Result;

/// Scores an epoch on total profit alone.
#[derive(Debug, Clone)]
pub struct OnlyProfitHyperOptLoss {
    settings: LossSettings,
}

impl OnlyProfitHyperOptLoss {
    pub const NAME: &'static str = "OnlyProfitHyperOptLoss";

    pub fn new(settings: LossSettings) -> Self {
        Self { settings }
    }

    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        Ok(Self::new(LossSettings::from_args(args)?))
    }
}

impl ObjectiveFunction for OnlyProfitHyperOptLoss {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn timeframe(&self) -> &str {
        &self.settings.timeframe
    }

    fn hyperopt_loss_function(
        &self,
        results: &[TradeRecord],
        _trade_count: usize,
        _min_date: DateTime<Utc>,
        _max_date: DateTime<Utc>,
    ) -> f64 {
        1.0 - total_profit(results) / EXPECTED_MAX_PROFIT
    }

    fn min_trades(&self) -> Option<usize> {
        self.settings.min_trades
    }
}
