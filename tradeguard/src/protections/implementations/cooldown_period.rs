//! Cooldown period protection

use chrono::{DateTime, Utc};

use crate::config::ProtectionParams;
use crate::data::{TradeFilter, TradeHistory};
use crate::protections::{lock_end_after_last_close, minutes_before, ProtectionRule, ProtectionVerdict};
use crate::resolver::PluginArgs;
use crate::Result;

/// Keeps a pair locked for `stop_duration` minutes after each closed trade.
#[derive(Debug)]
pub struct CooldownPeriod {
    params: ProtectionParams,
}

impl CooldownPeriod {
    pub const NAME: &'static str = "CooldownPeriod";

    pub fn new(params: ProtectionParams) -> Self {
        Self { params }
    }

    pub fn from_args(args: &PluginArgs) -> Result<Self> {
        Ok(Self::new(ProtectionParams::from_args(args, 1)?))
    }

    fn reason(&self) -> String {
        format!("Cooldown period of {} min.", self.params.stop_duration)
    }
}

impl ProtectionRule for CooldownPeriod {
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
            "{} - Cooldown period of {} min.",
            Self::NAME,
            self.params.stop_duration
        )
    }

    fn stop_per_pair(
        &self,
        pair: &str,
        trades: &dyn TradeHistory,
        now: DateTime<Utc>,
    ) -> Result<ProtectionVerdict> {
        // The window is the cooldown itself, not the lookback period
        let look_back_until = minutes_before(now, self.params.stop_duration);
        let recent = trades.query(&TradeFilter::closed_since(look_back_until).for_pair(Some(pair)))?;

        Ok(
            match lock_end_after_last_close(&recent, self.params.stop_duration) {
                Some(until) => ProtectionVerdict::lock(until, self.reason()),
                None => ProtectionVerdict::none(),
            },
        )
    }
}
