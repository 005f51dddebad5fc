//! Statistics used by protections

pub mod drawdown;

pub use drawdown::*;
