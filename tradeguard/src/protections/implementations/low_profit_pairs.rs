//! Low profit pairs protection

use chrono::{DateTime, Utc};

use crate::config::ProtectionParams;
use crate::data::TradeHistory;
use crate::protections::{minutes_after, recent_closed_trades, LogOnce, ProtectionRule, ProtectionVerdict};
use crate::resolver::PluginArgs;
use crate::Result;

/// Locks a pair whose summed profit in the lookback window is below
/// `required_profit`.
#[derive(Debug)]
pub struct LowProfitPairs {
    params: ProtectionParams,
    required_profit: f64,
    logged: LogOnce,
}

impl LowProfitPairs {
    pub const NAME: &'static str = "LowProfitPairs";

    pub fn new(params: ProtectionParams, required_profit: f64) -> Self {
        Self {
            params,
            required_profit,
            logged: LogOnce::new(),
        }
    }

    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        Ok(Self::new(
            ProtectionParams::from_args(args, 1)?,
            args.f64_or("required_profit", 0.0)?,
        ))
    }

    fn reason(&self, profit: f64) -> String {
        format!(
            "{} < {} in {} min, locking for {} min.",
            (profit * 10_000.0).round() / 10_000.0,
            self.required_profit,
            self.params.lookback_period,
            self.params.stop_duration
        )
    }
}

impl ProtectionRule for LowProfitPairs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supports_global(&self) -> bool {
        false
    }

    fn supports_per_pair(&self) -> bool {
        true
    }

    fn short_desc(&self) -> String {
        format!(
            "{} - Low Profit Protection, locks pairs with profit < {} within {} minutes.",
            Self::NAME,
            self.required_profit,
            self.params.lookback_period
        )
    }

    fn stop_per_pair(
        &self,
        pair: &str,
        trades: &dyn TradeHistory,
        now: DateTime<Utc>,
    ) -> Result<ProtectionVerdict> {
        let recent = recent_closed_trades(trades, &self.params, now, Some(pair))?;

        if recent.is_empty() || recent.len() < self.params.trade_limit {
            return Ok(ProtectionVerdict::none());
        }

        let profit: f64 = recent.iter().map(|t| t.profit_ratio()).sum();
        if profit < self.required_profit {
            self.logged.info(format!(
                "Trading for {} stopped due to {:.2} < {} within {} minutes.",
                pair, profit, self.required_profit, self.params.lookback_period
            ), now);
            let until = minutes_after(now, self.params.stop_duration);
            return Ok(ProtectionVerdict::lock(until, self.reason(profit)));
        }

        Ok(ProtectionVerdict::none())
    }
}
