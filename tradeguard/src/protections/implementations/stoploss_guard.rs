//! Stoploss guard protection

use chrono::{DateTime, Utc};

use crate::config::ProtectionParams;
use crate::data::TradeHistory;
use crate::protections::{
    lock_end_after_last_close, recent_closed_trades, LogOnce, ProtectionRule, ProtectionVerdict,
};
use crate::resolver::PluginArgs;
use crate::Result;

/// Stops trading after too many stop-loss exits inside the lookback window.
#[derive(Debug)]
pub struct StoplossGuard {
    params: ProtectionParams,
    logged: LogOnce,
}

impl StoplossGuard {
    pub const NAME: &'static str = "StoplossGuard";

    pub fn new(params: ProtectionParams) -> Self {
        Self {
            params,
            logged: LogOnce::new(),
        }
    }

    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        let params = ProtectionParams::from_args(args, 10)?;
        if params.trade_limit == 0 {
            anyhow::bail!("trade_limit must be at least 1 for {}", Self::NAME);
        }
        Ok(Self::new(params))
    }

    fn reason(&self) -> String {
        format!(
            "{} stoplosses in {} min, locking for {} min.",
            self.params.trade_limit, self.params.lookback_period, self.params.stop_duration
        )
    }

    fn stoploss_guard(
        &self,
        trades: &dyn TradeHistory,
        now: DateTime<Utc>,
        pair: Option<&str>,
    ) -> Result<ProtectionVerdict> {
        let stoplosses: Vec<_> = recent_closed_trades(trades, &self.params, now, pair)?
            .into_iter()
            .filter(|t| t.is_stoploss_exit())
            .collect();

        if stoplosses.len() < self.params.trade_limit {
            return Ok(ProtectionVerdict::none());
        }

        self.logged.info(format!(
            "Trading stopped due to {} stoplosses within {} minutes{}.",
            self.params.trade_limit,
            self.params.lookback_period,
            pair.map(|p| format!(" for {}", p)).unwrap_or_default()
        ), now);
        Ok(
            match lock_end_after_last_close(&stoplosses, self.params.stop_duration) {
                Some(until) => ProtectionVerdict::lock(until, self.reason()),
                None => ProtectionVerdict::none(),
            },
        )
    }
}

impl ProtectionRule for StoplossGuard {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supports_global(&self) -> bool {
        true
    }

    fn supports_per_pair(&self) -> bool {
        true
    }

    fn short_desc(&self) -> String {
        format!(
            "{} - Frequent Stoploss Guard, {} stoplosses within {} minutes.",
            Self::NAME,
            self.params.trade_limit,
            self.params.lookback_period
        )
    }

    fn global_stop(&self, trades: &dyn TradeHistory, now: DateTime<Utc>) -> Result<ProtectionVerdict> {
        self.stoploss_guard(trades, now, None)
    }

    fn stop_per_pair(
        &self,
        pair: &str,
        trades: &dyn TradeHistory,
        now: DateTime<Utc>,
    ) -> Result<ProtectionVerdict> {
        self.stoploss_guard(trades, now, Some(pair))
    }
}
