//! Maximum drawdown over a profit series

use crate::data::TradeRecord;

/// Largest peak-to-trough decline of a cumulative series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawdown {
    /// Size of the decline (always positive)
    pub drawdown: f64,
    /// Index of the peak preceding the trough
    pub peak_index: usize,
    /// Index of the trough
    pub trough_index: usize,
}

/// Maximum drawdown of the cumulative sum of `profits`.
///
/// Returns `None` for an empty series or when the cumulative profit never
/// falls below an earlier high.
pub fn calculate_max_drawdown(profits: &[f64]) -> Option<Drawdown> {
    let mut cumulative = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut peak_index = 0;
    let mut worst: Option<Drawdown> = None;

    for (i, profit) in profits.iter().enumerate() {
        cumulative += profit;
        if cumulative > peak {
            peak = cumulative;
            peak_index = i;
        }
        let decline = peak - cumulative;
        if decline > 0.0 && worst.map_or(true, |w| decline > w.drawdown) {
            worst = Some(Drawdown {
                drawdown: decline,
                peak_index,
                trough_index: i,
            });
        }
    }

    worst
}

/// Drawdown of closed trades ordered by close time.
pub fn trades_max_drawdown(trades: &[TradeRecord]) -> Option<Drawdown> {
    let mut ordered: Vec<&TradeRecord> = trades.iter().collect();
    ordered.sort_by_key(|t| t.close_date);
    let profits: Vec<f64> = ordered.iter().map(|t| t.profit_ratio()).collect();
    calculate_max_drawdown(&profits)
}
