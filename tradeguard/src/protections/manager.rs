//! Protection manager - runs every configured rule for one evaluation pass

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::data::TradeHistory;
use crate::error::ResolveError;
use crate::protections::{
    LockDirective, LockScope, ProtectionCapability, ProtectionRule, ProtectionVerdict,
};
use crate::resolver::ExtensionResolver;
use crate::Result;

/// A resolved rule and the name it was configured under
pub struct ConfiguredRule {
    pub name: String,
    pub rule: Box<dyn ProtectionRule>,
}

/// Owns the configured protection rules and evaluates them in order.
pub struct ProtectionManager {
    rules: Vec<ConfiguredRule>,
    trades: Arc<dyn TradeHistory>,
}

impl ProtectionManager {
    /// Manager without rules
    pub fn new(trades: Arc<dyn TradeHistory>) -> Self {
        Self {
            rules: Vec::new(),
            trades,
        }
    }

    /// Resolve every entry of `config.protections`, keeping configuration
    /// order. Any resolution failure aborts.
    pub fn from_config(
        config: &EngineConfig,
        resolver: &ExtensionResolver<ProtectionCapability>,
        trades: Arc<dyn TradeHistory>,
    ) -> std::result::Result<Self, ResolveError> {
        let search_path = config.protection_search_path();
        let mut manager = Self::new(trades);

        for protection in &config.protections {
            let resolved = resolver.resolve(
                protection.method.as_deref(),
                &search_path,
                protection.to_args(config.stop_duration),
            )?;
            manager.add_rule(resolved.name, resolved.instance);
        }

        if manager.rules.is_empty() {
            info!("No protections configured");
        }
        Ok(manager)
    }

    /// Append a rule; it is evaluated after all existing ones
    pub fn add_rule(&mut self, name: impl Into<String>, rule: Box<dyn ProtectionRule>) {
        self.rules.push(ConfiguredRule {
            name: name.into(),
            rule,
        });
    }

    /// Configured rule names, in evaluation order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Startup description of every rule
    pub fn short_descriptions(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.rule.short_desc()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every global-capable rule.
    ///
    /// Returns one directive per triggered rule, in configuration order.
    pub fn global_stop(&self, now: DateTime<Utc>) -> Vec<LockDirective> {
        self.evaluate(
            LockScope::Global,
            |rule| rule.supports_global(),
            |rule, trades| rule.global_stop(trades, now),
        )
    }

    /// Evaluate every per-pair-capable rule for `pair`.
    pub fn stop_per_pair(&self, pair: &str, now: DateTime<Utc>) -> Vec<LockDirective> {
        self.evaluate(
            LockScope::Pair(pair.to_string()),
            |rule| rule.supports_per_pair(),
            |rule, trades| rule.stop_per_pair(pair, trades, now),
        )
    }

    fn evaluate<S, E>(&self, scope: LockScope, supports: S, eval: E) -> Vec<LockDirective>
    where
        S: Fn(&dyn ProtectionRule) -> bool,
        E: Fn(&dyn ProtectionRule, &dyn TradeHistory) -> Result<ProtectionVerdict>,
    {
        let mut directives = Vec::new();

        for configured in &self.rules {
            let rule = configured.rule.as_ref();
            if !supports(rule) {
                continue;
            }

            let outcome = catch_unwind(AssertUnwindSafe(|| eval(rule, self.trades.as_ref())));
            let verdict = match outcome {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) => {
                    error!(
                        "Protection {} failed for scope {}: {:#}",
                        configured.name, scope, e
                    );
                    continue;
                }
                Err(panic) => {
                    error!(
                        "Protection {} panicked for scope {}: {}",
                        configured.name,
                        scope,
                        panic_message(panic.as_ref())
                    );
                    continue;
                }
            };

            if let Some(directive) =
                LockDirective::from_verdict(scope.clone(), verdict, &configured.name)
            {
                debug!(
                    "Protection {} locks {} until {}: {}",
                    configured.name, directive.scope, directive.until, directive.reason
                );
                directives.push(directive);
            }
        }

        directives
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
