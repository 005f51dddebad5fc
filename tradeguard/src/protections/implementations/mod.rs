//! Protection rule implementations

pub mod cooldown_period;
pub mod low_profit_pairs;
pub mod max_drawdown;
pub mod stoploss_guard;

pub use cooldown_period::CooldownPeriod;
pub use low_profit_pairs::LowProfitPairs;
pub use max_drawdown::MaxDrawdown;
pub use stoploss_guard::StoplossGuard;

use crate::protections::{ProtectionCapability, ProtectionRule};
use crate::resolver::ExtensionResolver;

impl ExtensionResolver<ProtectionCapability> {
    /// Resolver with every builtin protection registered
    pub fn with_builtins() -> Self {
        let mut resolver = Self::empty();

        resolver.register(MaxDrawdown::NAME, |args| {
            Ok(Box::new(MaxDrawdown::from_args(args)?) as Box<dyn ProtectionRule>)
        });
        resolver.register(StoplossGuard::NAME, |args| {
            Ok(Box::new(StoplossGuard::from_args(args)?) as Box<dyn ProtectionRule>)
        });
        resolver.register(CooldownPeriod::NAME, |args| {
            Ok(Box::new(CooldownPeriod::from_args(args)?) as Box<dyn ProtectionRule>)
        });
        resolver.register(LowProfitPairs::NAME, |args| {
            Ok(Box::new(LowProfitPairs::from_args(args)?) as Box<dyn ProtectionRule>)
        });

        resolver
    }
}
