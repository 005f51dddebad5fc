//! Protection rule interface and verdict types

use std::collections::HashMap;
use std::fmt;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ProtectionParams;
use crate::data::{TradeFilter, TradeHistory, TradeRecord};
use crate::resolver::{Capability, CapabilityContract};
use crate::Result;

/// Outcome of one rule evaluation.
///
/// `lock_until` and `reason` are set exactly when the verdict is triggered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtectionVerdict {
    lock: Option<(DateTime<Utc>, String)>,
}

impl ProtectionVerdict {
    /// Not triggered
    pub fn none() -> Self {
        Self { lock: None }
    }

    /// Triggered until `until`
    pub fn lock(until: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            lock: Some((until, reason.into())),
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.lock.is_some()
    }

    pub fn lock_until(&self) -> Option<DateTime<Utc>> {
        self.lock.as_ref().map(|(until, _)| *until)
    }

    pub fn reason(&self) -> Option<&str> {
        self.lock.as_ref().map(|(_, reason)| reason.as_str())
    }
}

/// What a lock applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// Every pair
    Global,
    /// A single pair
    Pair(String),
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("*"),
            Self::Pair(pair) => f.write_str(pair),
        }
    }
}

/// Instruction to stop entering trades for `scope` until `until`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDirective {
    pub scope: LockScope,
    pub until: DateTime<Utc>,
    pub reason: String,
    /// Name the emitting rule was configured under
    pub source_rule: String,
}

impl LockDirective {
    /// Directive for a triggered verdict, `None` otherwise
    pub fn from_verdict(
        scope: LockScope,
        verdict: ProtectionVerdict,
        source_rule: &str,
    ) -> Option<Self> {
        verdict.lock.map(|(until, reason)| Self {
            scope,
            until,
            reason,
            source_rule: source_rule.to_string(),
        })
    }
}

/// A risk heuristic that can halt trading based on recent trades.
///
/// Evaluations must return the same verdict for the same trade history and
/// `now`, and must treat an empty history as "not triggered".
pub trait ProtectionRule: Send + Sync {
    /// Implementation name
    fn name(&self) -> &str;

    /// Whether [`ProtectionRule::global_stop`] is meaningful
    fn supports_global(&self) -> bool;

    /// Whether [`ProtectionRule::stop_per_pair`] is meaningful
    fn supports_per_pair(&self) -> bool;

    /// One-line description with active thresholds, for startup messages
    fn short_desc(&self) -> String;

    /// Stop entering trades for all pairs
    fn global_stop(&self, _trades: &dyn TradeHistory, _now: DateTime<Utc>) -> Result<ProtectionVerdict> {
        Ok(ProtectionVerdict::none())
    }

    /// Stop entering trades for `pair`
    fn stop_per_pair(
        &self,
        _pair: &str,
        _trades: &dyn TradeHistory,
        _now: DateTime<Utc>,
    ) -> Result<ProtectionVerdict> {
        Ok(ProtectionVerdict::none())
    }
}

/// Contract binding for [`ProtectionRule`] plugins.
pub struct ProtectionCapability;

impl Capability for ProtectionCapability {
    type Instance = dyn ProtectionRule;

    const CONTRACT: CapabilityContract = CapabilityContract {
        name: "ProtectionRule",
        setting: "protections[].method",
        hint: "\"method\" in each protections entry",
        required: &["short_desc", "lock_scope"],
        optional: &[],
    };

    fn provided_operations(rule: &dyn ProtectionRule) -> Vec<&'static str> {
        let mut ops = Vec::new();
        if !rule.short_desc().trim().is_empty() {
            ops.push("short_desc");
        }
        if rule.supports_global() || rule.supports_per_pair() {
            ops.push("lock_scope");
        }
        ops
    }
}

/// How long a logged message stays muted
pub const LOG_ONCE_TTL_MINUTES: i64 = 60;

/// Emits each distinct message at most once per TTL per rule instance.
#[derive(Debug)]
pub struct LogOnce {
    ttl: Duration,
    seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for LogOnce {
    fn default() -> Self {
        Self::with_ttl(Duration::minutes(LOG_ONCE_TTL_MINUTES))
    }
}

impl LogOnce {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Log `message` at info level unless it was logged within the TTL.
    ///
    /// Returns whether the message was emitted. Expired entries are dropped.
    pub fn info(&self, message: String, now: DateTime<Utc>) -> bool {
        let mut seen = self.seen.lock();
        seen.retain(|_, logged_at| now.signed_duration_since(*logged_at) < self.ttl);
        if seen.contains_key(&message) {
            return false;
        }
        info!("{}", message);
        seen.insert(message, now);
        true
    }
}

/// Closed trades inside the rule's lookback window, optionally for one pair.
pub fn recent_closed_trades(
    trades: &dyn TradeHistory,
    params: &ProtectionParams,
    now: DateTime<Utc>,
    pair: Option<&str>,
) -> Result<Vec<TradeRecord>> {
    let look_back_until = minutes_before(now, params.lookback_period);
    let filter = TradeFilter::closed_since(look_back_until).for_pair(pair);
    trades
        .query(&filter)
        .with_context(|| format!("Trade history query failed for {:?}", filter))
}

/// Latest close date among `trades` plus `stop_minutes`.
pub fn lock_end_after_last_close(trades: &[TradeRecord], stop_minutes: u64) -> Option<DateTime<Utc>> {
    trades
        .iter()
        .filter_map(|t| t.close_date)
        .max()
        .map(|last| minutes_after(last, stop_minutes))
}

/// `time + value` minutes, saturating at the latest representable time.
pub(crate) fn minutes_after(time: DateTime<Utc>, value: u64) -> DateTime<Utc> {
    time.checked_add_signed(minutes(value))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `time - value` minutes, saturating at the earliest representable time.
pub(crate) fn minutes_before(time: DateTime<Utc>, value: u64) -> DateTime<Utc> {
    time.checked_sub_signed(minutes(value))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn minutes(value: u64) -> Duration {
    Duration::minutes(i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 60_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_verdict_invariant() {
        let none = ProtectionVerdict::none();
        assert!(!none.is_triggered());
        assert!(none.lock_until().is_none());
        assert!(none.reason().is_none());

        let until = Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap();
        let lock = ProtectionVerdict::lock(until, "because");
        assert!(lock.is_triggered());
        assert_eq!(lock.lock_until(), Some(until));
        assert_eq!(lock.reason(), Some("because"));
    }

    #[test]
    fn test_directive_only_for_triggered() {
        assert!(LockDirective::from_verdict(LockScope::Global, ProtectionVerdict::none(), "X").is_none());

        let until = Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap();
        let directive = LockDirective::from_verdict(
            LockScope::Pair("BTC/USDT".to_string()),
            ProtectionVerdict::lock(until, "cooldown"),
            "CooldownPeriod",
        )
        .unwrap();
        assert_eq!(directive.until, until);
        assert_eq!(directive.source_rule, "CooldownPeriod");
        assert_eq!(directive.scope.to_string(), "BTC/USDT");
    }

    #[test]
    fn test_log_once_dedups_within_ttl() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let log = LogOnce::new();
        assert!(log.info("a".to_string(), start));
        assert!(!log.info("a".to_string(), start + Duration::minutes(30)));
        assert!(log.info("b".to_string(), start + Duration::minutes(30)));
        assert_eq!(log.seen.lock().len(), 2);

        // "a" expired; "b" is still muted
        assert!(log.info("a".to_string(), start + Duration::minutes(61)));
        assert!(!log.info("b".to_string(), start + Duration::minutes(61)));
    }

    #[test]
    fn test_log_once_evicts_expired_entries() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let log = LogOnce::with_ttl(Duration::minutes(5));
        for i in 0..10 {
            log.info(format!("message {i}"), start);
        }
        assert_eq!(log.seen.lock().len(), 10);

        log.info("later".to_string(), start + Duration::minutes(5));
        assert_eq!(log.seen.lock().len(), 1);
    }

    #[test]
    fn test_time_helpers_saturate() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(minutes_after(now, 30), now + Duration::minutes(30));
        assert_eq!(minutes_before(now, 30), now - Duration::minutes(30));
        assert_eq!(minutes_after(now, 10_000_000_000_000), DateTime::<Utc>::MAX_UTC);
        assert_eq!(minutes_after(now, u64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(minutes_before(now, u64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
