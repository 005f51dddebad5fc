//! Trade data module
//!
//! Trade records and the store protections query them from.

pub mod store;
pub mod trade;

pub use store::*;
pub use trade::*;
