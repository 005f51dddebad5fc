//! Max drawdown protection

use chrono::{DateTime, Utc};

use crate::config::ProtectionParams;
use crate::data::TradeHistory;
use crate::protections::{minutes_after, recent_closed_trades, LogOnce, ProtectionRule, ProtectionVerdict};
use crate::resolver::PluginArgs;
use crate::stats::trades_max_drawdown;
use crate::Result;

/// Stops all trading when recent closed trades draw down more than allowed.
///
/// Global only; the per-pair evaluation never triggers.
#[derive(Debug)]
pub struct MaxDrawdown {
    params: ProtectionParams,
    max_allowed_drawdown: f64,
    logged: LogOnce,
}

impl MaxDrawdown {
    pub const NAME: &'static str = "MaxDrawdown";

    pub fn new(params: ProtectionParams, max_allowed_drawdown: f64) -> Self {
        Self {
            params,
            max_allowed_drawdown,
            logged: LogOnce::new(),
        }
    }

    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        let max_allowed_drawdown = args.f64_or("max_allowed_drawdown", 0.0)?;
        if !max_allowed_drawdown.is_finite() || max_allowed_drawdown < 0.0 {
            anyhow::bail!(
                "max_allowed_drawdown must be a non-negative number, got {}",
                max_allowed_drawdown
            );
        }
        Ok(Self::new(ProtectionParams::from_args(args, 1)?, max_allowed_drawdown))
    }

    fn reason(&self, drawdown: f64) -> String {
        format!(
            "{} > {} in {} min, locking for {} min.",
            round_ratio(drawdown),
            self.max_allowed_drawdown,
            self.params.lookback_period,
            self.params.stop_duration
        )
    }

    fn max_drawdown(
        &self,
        trades: &dyn TradeHistory,
        now: DateTime<Utc>,
    ) -> Result<ProtectionVerdict> {
        let recent = recent_closed_trades(trades, &self.params, now, None)?;

        if recent.len() < self.params.trade_limit {
            // Not enough trades in the relevant period
            return Ok(ProtectionVerdict::none());
        }

        let drawdown = trades_max_drawdown(&recent).map_or(0.0, |dd| dd.drawdown);

        if drawdown > self.max_allowed_drawdown {
            self.logged.info(format!(
                "Trading stopped due to Max Drawdown {:.2} > {} within {} minutes.",
                drawdown, self.max_allowed_drawdown, self.params.lookback_period
            ), now);
            let until = minutes_after(now, self.params.stop_duration);
            return Ok(ProtectionVerdict::lock(until, self.reason(drawdown)));
        }

        Ok(ProtectionVerdict::none())
    }
}

impl ProtectionRule for MaxDrawdown {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supports_global(&self) -> bool {
        true
    }

    fn supports_per_pair(&self) -> bool {
        false
    }

    fn short_desc(&self) -> String {
        format!(
            "{} - Max drawdown protection, stop trading if drawdown is > {} within {} minutes.",
            Self::NAME,
            self.max_allowed_drawdown,
            self.params.lookback_period
        )
    }

    fn global_stop(&self, trades: &dyn TradeHistory, now: DateTime<Utc>) -> Result<ProtectionVerdict> {
        self.max_drawdown(trades, now)
    }

    fn stop_per_pair(
        &self,
        _pair: &str,
        _trades: &dyn TradeHistory,
        _now: DateTime<Utc>,
    ) -> Result<ProtectionVerdict> {
        Ok(ProtectionVerdict::none())
    }
}

/// Four decimals, so float noise stays out of lock reasons.
fn round_ratio(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
