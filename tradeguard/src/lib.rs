//! Tradeguard: plugin resolution and protection rules for a trading engine
//!
//! This crate provides the two pieces a bot needs before it is allowed to
//! open new positions:
//!
//! - **Extension resolution**: locate a named plugin (protection rule,
//!   hyperopt loss function) across an ordered list of plugin locations and
//!   construct it against a capability contract
//! - **Protections**: evaluate recent closed trades and emit time-bounded
//!   lock directives, globally or per pair
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tradeguard::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config: EngineConfig = serde_json::from_value(serde_json::json!({
//!         "stop_duration": 30,
//!         "protections": [
//!             { "method": "MaxDrawdown", "max_allowed_drawdown": 0.1 }
//!         ]
//!     }))?;
//!     let store = Arc::new(InMemoryTradeStore::new());
//!     let resolver = ExtensionResolver::<ProtectionCapability>::with_builtins();
//!     let manager = ProtectionManager::from_config(&config, &resolver, store)?;
//!     for directive in manager.global_stop(chrono::Utc::now()) {
//!         println!("{}", directive.reason);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod optimize;
pub mod protections;
pub mod resolver;
pub mod stats;

// Re-export commonly used types
pub mod prelude {
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::error::*;
    pub use crate::optimize::*;
    pub use crate::protections::*;
    pub use crate::resolver::*;
    pub use crate::stats::*;

    pub use anyhow::{Context, Result};
}

/// Result type alias
pub type Result<T> = anyhow::Result<T>;
