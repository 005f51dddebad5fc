//! Sharpe ratio loss

use chrono::{DateTime, Utc};

use crate::data::TradeRecord;
use crate::optimize::{LossSettings, ObjectiveFunction};
use crate::resolver::PluginArgs;
use crate::Result;

/// Loss returned when returns have no spread at all
const ZERO_DEVIATION_LOSS: f64 = 20.0;

/// Negated annualized Sharpe ratio of per-trade returns.
#[derive(Debug, Clone)]
pub struct SharpeHyperOptLoss {
    settings: LossSettings,
}

impl SharpeHyperOptLoss {
    pub const NAME: &'static str = "SharpeHyperOptLoss";

    pub fn new(settings: LossSettings) -> Self {
        Self { settings }
    }

    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        Ok(Self::new(LossSettings::from_args(args)?))
    }
}

impl ObjectiveFunction for SharpeHyperOptLoss {
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
        min_date: DateTime<Utc>,
        max_date: DateTime<Utc>,
    ) -> f64 {
        if results.is_empty() {
            return ZERO_DEVIATION_LOSS;
        }

        let profits: Vec<f64> = results.iter().map(|t| t.profit_ratio()).collect();
        let days = (max_date - min_date).num_days().max(1) as f64;
        let n = profits.len() as f64;

        let mean = profits.iter().sum::<f64>() / n;
        let variance = profits.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev == 0.0 {
            return ZERO_DEVIATION_LOSS;
        }

        let expected_returns_mean = profits.iter().sum::<f64>() / days;
        -(expected_returns_mean / std_dev * 365f64.sqrt())
    }

    fn min_trades(&self) -> Option<usize> {
        self.settings.min_trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ExitReason;
    use chrono::{Duration, TimeZone};

    fn loss() -> SharpeHyperOptLoss {
        SharpeHyperOptLoss::new(LossSettings {
            timeframe: "5m".to_string(),
            min_trades: None,
        })
    }

    fn trade(id: u64, profit: f64) -> TradeRecord {
        let open = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TradeRecord::closed(id, "BTC/USDT", open, open + Duration::hours(1), profit, ExitReason::Roi)
    }

    #[test]
    fn test_known_value() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(10);
        let results = vec![trade(1, 0.1), trade(2, -0.1), trade(3, 0.3)];
        // Sum 0.3 over 10 days; deviations from the 0.1 mean are 0, -0.2, 0.2
        let std = (0.08f64 / 3.0).sqrt();
        let expected = -(0.03 / std * 365f64.sqrt());
        let value = loss().hyperopt_loss_function(&results, 3, start, end);
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_deviation() {
        let now = Utc::now();
        let results = vec![trade(1, 0.05), trade(2, 0.05)];
        assert_eq!(loss().hyperopt_loss_function(&results, 2, now, now), 20.0);
        assert_eq!(loss().hyperopt_loss_function(&[], 0, now, now), 20.0);
    }

    #[test]
    fn test_profitable_spread_is_negative() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let results = vec![trade(1, 0.02), trade(2, 0.04)];
        // Less than a day counts as one day
        let value = loss().hyperopt_loss_function(&results, 2, start, start + Duration::hours(3));
        assert!(value < 0.0);
    }
}
