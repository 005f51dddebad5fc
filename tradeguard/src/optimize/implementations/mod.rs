//! Builtin hyperopt loss functions

pub mod only_profit;
pub mod sharpe;
pub mod short_trade_dur;

pub use only_profit::OnlyProfitHyperOptLoss;
pub use sharpe::SharpeHyperOptLoss;
pub use short_trade_dur::ShortTradeDurHyperOptLoss;

use crate::optimize::{ObjectiveCapability, ObjectiveFunction};
use crate::resolver::ExtensionResolver;

/// Loss used when a caller needs a sensible default
pub const DEFAULT_HYPEROPT_LOSS: &str = ShortTradeDurHyperOptLoss::NAME;

/// Expected total profit ratio of a good epoch
pub(crate) const EXPECTED_MAX_PROFIT: f64 = 3.0;

impl ExtensionResolver<ObjectiveCapability> {
    /// Resolver with every builtin loss function registered
    pub fn with_builtins() -> Self {
        let mut resolver = Self::empty();

        resolver.register(ShortTradeDurHyperOptLoss::NAME, |args| {
            Ok(Box::new(ShortTradeDurHyperOptLoss::from_args(args)?) as Box<dyn ObjectiveFunction>)
        });
        resolver.register(OnlyProfitHyperOptLoss::NAME, |args| {
            Ok(Box::new(OnlyProfitHyperOptLoss::from_args(args)?) as Box<dyn ObjectiveFunction>)
        });
        resolver.register(SharpeHyperOptLoss::NAME, |args| {
            Ok(Box::new(SharpeHyperOptLoss::from_args(args)?) as Box<dyn ObjectiveFunction>)
        });

        resolver
    }
}
