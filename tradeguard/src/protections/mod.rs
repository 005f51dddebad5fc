//! Protection rules and the manager that evaluates them

pub mod implementations;
pub mod manager;
pub mod rule;

pub use implementations::*;
pub use manager::*;
pub use rule::*;

pub(crate) use rule::{minutes_after, minutes_before};
