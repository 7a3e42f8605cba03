//! # Swap Engine
//!
//! Main entry point: loads configuration, builds the venue registry and
//! balance read paths, and reports the routing table.

use std::sync::Arc;

use anyhow::Context;
use swap_engine::application::{
    BalanceReadPath, BalanceReconciliationService, InMemoryLivenessStore, QuoteAggregator,
};
use swap_engine::config::{AppConfig, LogConfig, LogFormat};
use swap_engine::domain::value_objects::{Clock, SystemClock};
use swap_engine::infrastructure::balances::{IndexerBalanceReadPath, RpcBalanceReadPath};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(log.include_target);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn read_paths(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn BalanceReadPath>>> {
    let timeout_ms = config.reconciliation.read_timeout_ms;
    let mut paths: Vec<Arc<dyn BalanceReadPath>> = Vec::new();
    if let Some(url) = &config.reconciliation.rpc_url {
        paths.push(Arc::new(
            RpcBalanceReadPath::new(url.clone(), timeout_ms).context("rpc read path")?,
        ));
    }
    if let Some(url) = &config.reconciliation.indexer_url {
        paths.push(Arc::new(
            IndexerBalanceReadPath::new(url.clone(), timeout_ms).context("indexer read path")?,
        ));
    }
    Ok(paths)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    init_tracing(&config.log);

    info!("Starting swap engine v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let assets = config.asset_catalog()?;
    let registry = Arc::new(config.venue_registry(Arc::clone(&clock)).await?);

    for venue in registry.by_priority().await {
        info!(
            venue = %venue.venue_id(),
            priority = venue.settings.priority(),
            routable = venue.settings.capabilities().is_routable(),
            "venue enabled"
        );
    }
    if registry.by_priority().await.is_empty() {
        warn!("no enabled venues, every swap will fail with no route");
    }

    let aggregator = QuoteAggregator::new(
        Arc::clone(&registry),
        Arc::new(InMemoryLivenessStore::new()),
        Arc::clone(&clock),
        config.aggregator.aggregator_config(),
    );
    for summary in aggregator.liveness_summary().await {
        info!(venue = %summary.venue_id, liveness = %summary.liveness, "initial liveness");
    }

    let paths = read_paths(&config)?;
    if paths.len() < 2 {
        warn!(
            configured = paths.len(),
            "fewer than two balance read paths configured"
        );
    }
    let reconciliation = BalanceReconciliationService::new(
        paths,
        Arc::clone(&clock),
        config.reconciliation.reconciliation_config(),
    );

    match config.staking_config()? {
        Some(staking) => info!(asset = %staking.asset, apy = %staking.apy, "staking enabled"),
        None => info!("staking disabled"),
    }

    info!(
        assets = assets.len(),
        rate_limit_secs = reconciliation.config().rate_limit_window.as_secs(),
        "Swap engine ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down swap engine");

    Ok(())
}
