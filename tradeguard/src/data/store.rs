//! Trade history access

use std::path::Path;

use anyhow::Context;
use parking_lot::RwLock;

use crate::data::{TradeFilter, TradeRecord};
use crate::Result;

/// Queryable store of trade records.
///
/// The order of returned records is unspecified; callers sort where order
/// matters. Implementations report failures instead of retrying.
pub trait TradeHistory: Send + Sync {
    /// Return every trade matching `filter`
    fn query(&self, filter: &TradeFilter) -> Result<Vec<TradeRecord>>;
}

/// In-memory trade store
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    trades: RwLock<Vec<TradeRecord>>,
}

impl InMemoryTradeStore {
    /// Create new store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store from records
    pub fn from_trades(trades: Vec<TradeRecord>) -> Self {
        Self {
            trades: RwLock::new(trades),
        }
    }

    /// Load a JSON array of trade records
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Ok(Self::from_trades(load_json_trades(path)?))
    }

    /// Swap the whole content, e.g. after re-reading an export
    pub fn replace_all(&self, trades: Vec<TradeRecord>) {
        *self.trades.write() = trades;
    }

    /// Add a trade
    pub fn add_trade(&self, trade: TradeRecord) {
        self.trades.write().push(trade);
    }

    /// Add multiple trades
    pub fn add_trades(&self, trades: impl IntoIterator<Item = TradeRecord>) {
        self.trades.write().extend(trades);
    }

    /// Replace a trade with the same ID, e.g. after it closed
    pub fn upsert_trade(&self, trade: TradeRecord) {
        let mut trades = self.trades.write();
        match trades.iter_mut().find(|t| t.id == trade.id) {
            Some(existing) => *existing = trade,
            None => trades.push(trade),
        }
    }

    /// Clear all data
    pub fn clear(&self) {
        self.trades.write().clear();
    }

    /// Get number of stored trades
    pub fn len(&self) -> usize {
        self.trades.read().len()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.trades.read().is_empty()
    }
}

/// Read a JSON array of trade records
pub fn load_json_trades(path: &Path) -> Result<Vec<TradeRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trades from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse trades in {}", path.display()))
}

impl TradeHistory for InMemoryTradeStore {
    fn query(&self, filter: &TradeFilter) -> Result<Vec<TradeRecord>> {
        Ok(self
            .trades
            .read()
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }
}
