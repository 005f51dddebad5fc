//! Default loss: many profitable, short trades

use chrono::{DateTime, Utc};

use crate::data::TradeRecord;
use crate::optimize::implementations::EXPECTED_MAX_PROFIT;
use crate::optimize::loss::total_profit;
use crate::optimize::{LossSettings, ObjectiveFunction};
use crate::resolver::PluginArgs;
use crate::Result;

const TARGET_TRADES: f64 = 600.0;
const MAX_ACCEPTED_TRADE_DURATION: f64 = 300.0;

/// Rewards epochs close to 600 trades, high profit and short holding times.
#[derive(Debug, Clone)]
pub struct ShortTradeDurHyperOptLoss {
    settings: LossSettings,
}

impl ShortTradeDurHyperOptLoss {
    pub const NAME: &'static str = "ShortTradeDurHyperOptLoss";

    pub fn new(settings: LossSettings) -> Self {
        Self { settings }
    }

    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        Ok(Self::new(LossSettings::from_args(args)?))
    }
}

impl ObjectiveFunction for ShortTradeDurHyperOptLoss {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn timeframe(&self) -> &str {
        &self.settings.timeframe
    }

    fn hyperopt_loss_function(
        &self,
        results: &[TradeRecord],
        trade_count: usize,
        _min_date: DateTime<Utc>,
        _max_date: DateTime<Utc>,
    ) -> f64 {
        let trade_loss =
            1.0 - 0.25 * (-(trade_count as f64 - TARGET_TRADES).powi(2) / 10f64.powf(5.8)).exp();
        let profit_loss = (1.0 - total_profit(results) / EXPECTED_MAX_PROFIT).max(0.0);

        let mean_duration = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|t| t.duration_minutes()).sum::<f64>() / results.len() as f64
        };
        let duration_loss = 0.4 * (mean_duration / MAX_ACCEPTED_TRADE_DURATION).min(1.0);

        trade_loss + profit_loss + duration_loss
    }

    fn min_trades(&self) -> Option<usize> {
        self.settings.min_trades
    }
}
