use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;

/// Runner settings, read from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// JSON engine configuration
    pub config_path: PathBuf,
    /// JSON array of trade records, re-read on every tick
    pub trades_path: PathBuf,
    /// Time between evaluation passes
    pub interval: Duration,
    /// Pairs checked for per-pair locks
    pub pairs: Vec<String>,
}

impl RunnerSettings {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let interval_secs: u64 = std::env::var("TRADEGUARD_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("TRADEGUARD_INTERVAL_SECS must be a number of seconds")?;

        Ok(RunnerSettings {
            config_path: std::env::var("TRADEGUARD_CONFIG")
                .unwrap_or_else(|_| "config.json".to_string())
                .into(),
            trades_path: std::env::var("TRADEGUARD_TRADES")
                .unwrap_or_else(|_| "user_data/trades.json".to_string())
                .into(),
            interval: Duration::from_secs(interval_secs.max(1)),
            pairs: parse_pairs(&std::env::var("TRADEGUARD_PAIRS").unwrap_or_default()),
        })
    }
}

fn parse_pairs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
