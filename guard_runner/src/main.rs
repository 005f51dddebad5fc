use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use tradeguard::prelude::*;

mod settings;

use settings::RunnerSettings;

// Protection runner
// Periodically evaluates the configured protections against a trade export

fn load_config(settings: &RunnerSettings) -> Result<EngineConfig> {
    let raw = std::fs::read_to_string(&settings.config_path)
        .with_context(|| format!("Failed to read config {}", settings.config_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", settings.config_path.display()))?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid engine config in {}", settings.config_path.display()))
}

fn load_trades(store: &InMemoryTradeStore, settings: &RunnerSettings) -> Result<()> {
    store.replace_all(load_json_trades(&settings.trades_path)?);
    Ok(())
}

fn refresh_trades(store: &InMemoryTradeStore, settings: &RunnerSettings) {
    // Keep evaluating against the last good snapshot
    if let Err(e) = load_trades(store, settings) {
        warn!("Could not refresh trades: {:#}", e);
    }
}

fn evaluate(manager: &ProtectionManager, pairs: &[String]) {
    let now = Utc::now();

    for directive in manager.global_stop(now) {
        info!(
            "🔒 [{}] all pairs locked until {}: {}",
            directive.source_rule, directive.until, directive.reason
        );
    }
    for pair in pairs {
        for directive in manager.stop_per_pair(pair, now) {
            info!(
                "🔒 [{}] {} locked until {}: {}",
                directive.source_rule, directive.scope, directive.until, directive.reason
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = RunnerSettings::from_env()?;
    info!("Starting protection runner with {:?}", settings);

    let config = load_config(&settings)?;

    if config.hyperopt_loss.is_some() {
        let loss = load_hyperopt_loss(&config, &ExtensionResolver::<ObjectiveCapability>::with_builtins())?;
        info!("Hyperopt loss {} available (min trades {})", loss.name, loss.min_trades);
    }

    let store = Arc::new(InMemoryTradeStore::new());
    load_trades(&store, &settings).context("Initial trade load failed")?;
    info!("Loaded {} trades from {}", store.len(), settings.trades_path.display());

    let resolver = ExtensionResolver::<ProtectionCapability>::with_builtins();
    let manager = ProtectionManager::from_config(&config, &resolver, store.clone())?;
    for description in manager.short_descriptions() {
        info!("Protection: {}", description);
    }
    if manager.is_empty() {
        warn!("No protections configured, nothing to evaluate");
        return Ok(());
    }

    let mut timer = tokio::time::interval(settings.interval);
    loop {
        tokio::select! {
            _ = timer.tick() => {
                refresh_trades(&store, &settings);
                evaluate(&manager, &settings.pairs);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutting down...");
                break;
            }
        }
    }

    Ok(())
}
