//! Optimization objective functions
//!
//! A hyperopt loss function scores one backtest result; lower is better.

pub mod implementations;
pub mod loss;

pub use implementations::*;
pub use loss::*;
