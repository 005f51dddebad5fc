//! Trade records as seen by protections and loss functions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a trade was closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Minimal ROI reached
    Roi,
    /// Stop loss hit
    StopLoss,
    /// Stop loss order filled on the exchange
    StoplossOnExchange,
    /// Trailing stop loss hit
    TrailingStopLoss,
    /// Strategy exit signal
    ExitSignal,
    /// Closed manually
    ForceExit,
    /// Anything else the engine reports
    #[serde(untagged)]
    Other(String),
}

impl ExitReason {
    /// Stop-loss style exit
    pub fn is_stoploss(&self) -> bool {
        matches!(
            self,
            Self::StopLoss | Self::StoplossOnExchange | Self::TrailingStopLoss
        )
    }
}

/// Trade record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Trade ID
    pub id: u64,
    /// Pair (e.g., "BTC/USDT")
    pub pair: String,
    /// Still open
    pub is_open: bool,
    /// Entry time
    pub open_date: DateTime<Utc>,
    /// Exit time
    #[serde(default)]
    pub close_date: Option<DateTime<Utc>>,
    /// Realized profit as a ratio of stake (0.05 = 5%)
    #[serde(default)]
    pub close_profit: Option<f64>,
    /// Realized profit in stake currency
    #[serde(default)]
    pub profit_abs: Option<f64>,
    /// Exit reason
    #[serde(default)]
    pub exit_reason: Option<ExitReason>,
}

impl TradeRecord {
    /// Create an open trade
    pub fn open(id: u64, pair: impl Into<String>, open_date: DateTime<Utc>) -> Self {
        Self {
            id,
            pair: pair.into(),
            is_open: true,
            open_date,
            close_date: None,
            close_profit: None,
            profit_abs: None,
            exit_reason: None,
        }
    }

    /// Create a closed trade
    pub fn closed(
        id: u64,
        pair: impl Into<String>,
        open_date: DateTime<Utc>,
        close_date: DateTime<Utc>,
        close_profit: f64,
        exit_reason: ExitReason,
    ) -> Self {
        Self {
            id,
            pair: pair.into(),
            is_open: false,
            open_date,
            close_date: Some(close_date),
            close_profit: Some(close_profit),
            profit_abs: None,
            exit_reason: Some(exit_reason),
        }
    }

    /// Set absolute profit
    pub fn with_profit_abs(mut self, profit_abs: f64) -> Self {
        self.profit_abs = Some(profit_abs);
        self
    }

    /// Profit ratio, zero while open
    pub fn profit_ratio(&self) -> f64 {
        self.close_profit.unwrap_or(0.0)
    }

    /// Holding time in minutes, zero while open
    pub fn duration_minutes(&self) -> f64 {
        self.close_date
            .map(|close| (close - self.open_date).num_seconds() as f64 / 60.0)
            .unwrap_or(0.0)
    }

    /// Closed with a stop loss and, for trailing stops, at a loss
    pub fn is_stoploss_exit(&self) -> bool {
        match &self.exit_reason {
            Some(ExitReason::TrailingStopLoss) => self.profit_ratio() < 0.0,
            Some(reason) => reason.is_stoploss(),
            None => false,
        }
    }
}

/// Query predicate for [`crate::data::TradeHistory`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeFilter {
    /// Open (`true`) or closed (`false`) trades
    pub is_open: bool,
    /// Only trades closed strictly after this time
    pub closed_after: Option<DateTime<Utc>>,
    /// Only this pair
    pub pair: Option<String>,
}

impl TradeFilter {
    /// Closed trades with `close_date > since`
    pub fn closed_since(since: DateTime<Utc>) -> Self {
        Self {
            is_open: false,
            closed_after: Some(since),
            pair: None,
        }
    }

    /// Restrict to one pair
    pub fn for_pair(mut self, pair: Option<&str>) -> Self {
        self.pair = pair.map(str::to_string);
        self
    }

    /// Check a record against the filter
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        if trade.is_open != self.is_open {
            return false;
        }
        if let Some(after) = self.closed_after {
            match trade.close_date {
                Some(close) if close > after => {}
                _ => return false,
            }
        }
        match &self.pair {
            Some(pair) => &trade.pair == pair,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_exit_reason_serde() {
        let json = serde_json::to_string(&ExitReason::StoplossOnExchange).unwrap();
        assert_eq!(json, "\"stoploss_on_exchange\"");
        let parsed: ExitReason = serde_json::from_str("\"liquidation\"").unwrap();
        assert_eq!(parsed, ExitReason::Other("liquidation".to_string()));
    }

    #[test]
    fn test_trailing_stop_counts_only_on_loss() {
        let open = t0();
        let close = open + Duration::minutes(30);
        let winner =
            TradeRecord::closed(1, "ETH/USDT", open, close, 0.02, ExitReason::TrailingStopLoss);
        let loser =
            TradeRecord::closed(2, "ETH/USDT", open, close, -0.02, ExitReason::TrailingStopLoss);
        let stop = TradeRecord::closed(3, "ETH/USDT", open, close, 0.01, ExitReason::StopLoss);
        assert!(!winner.is_stoploss_exit());
        assert!(loser.is_stoploss_exit());
        assert!(stop.is_stoploss_exit());
        assert_eq!(loser.duration_minutes(), 30.0);
    }

    #[test]
    fn test_filter_close_bound_is_strict() {
        let close = t0();
        let trade = TradeRecord::closed(
            1,
            "BTC/USDT",
            close - Duration::hours(1),
            close,
            0.01,
            ExitReason::Roi,
        );
        assert!(!TradeFilter::closed_since(close).matches(&trade));
        assert!(TradeFilter::closed_since(close - Duration::seconds(1)).matches(&trade));
        assert!(!TradeFilter::closed_since(close - Duration::seconds(1))
            .for_pair(Some("ETH/USDT"))
            .matches(&trade));
        assert!(!TradeFilter::closed_since(close - Duration::seconds(1))
            .matches(&TradeRecord::open(2, "BTC/USDT", close)));
    }
}
