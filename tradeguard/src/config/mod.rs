//! Configuration module

pub mod engine;
pub mod protection;

pub use engine::*;
pub use protection::*;
