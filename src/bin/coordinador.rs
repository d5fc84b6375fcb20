//! Coordinador - occupancy aggregation node
//!
//! Queries every configured lot's status and serves the combined summary
//! (/resumen). Unreachable lots degrade their own entry only.

use clap::Parser;
use parqueadero::infra::Config;
use parqueadero::io::start_coordinator_server;
use parqueadero::services::Aggregator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Coordinador - aggregated occupancy view over the configured lots
#[derive(Parser, Debug)]
#[command(name = "coordinador", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/coordinador.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        port = %config.coordinator_port(),
        lot_endpoints = ?config.lot_endpoints(),
        query_timeout_ms = %config.query_timeout_ms(),
        "config_loaded"
    );

    let aggregator = Arc::new(Aggregator::new(
        config.lot_endpoints().to_vec(),
        Duration::from_millis(config.query_timeout_ms()),
    )?);

    // Handle shutdown on Ctrl+C
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    start_coordinator_server(config.coordinator_port(), aggregator, shutdown_rx).await?;

    info!("coordinador_shutdown_complete");
    Ok(())
}
