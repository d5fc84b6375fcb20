//! Parqueadero - single parking lot node
//!
//! One independent lot: owns the vehicle session registry and serves the
//! per-lot HTTP boundary (/ingreso, /salida, /estado).
//!
//! Module structure:
//! - `domain/` - Core parking types (sessions, receipts, status payload)
//! - `services/` - Business logic (registry, aggregator)
//! - `io/` - HTTP boundaries (lot server, coordinator server)
//! - `infra/` - Infrastructure (config)

use clap::Parser;
use parqueadero::infra::Config;
use parqueadero::io::start_lot_server;
use parqueadero::services::LotRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Parqueadero - parking lot occupancy node
#[derive(Parser, Debug)]
#[command(name = "parqueadero", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/parqueadero.toml")]
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
        lot = %config.lot_name(),
        port = %config.lot_port(),
        "config_loaded"
    );

    // The registry is the only state this process owns; it dies with it.
    let registry = Arc::new(LotRegistry::new());

    // Handle shutdown on Ctrl+C
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    start_lot_server(config.lot_port(), registry, shutdown_rx).await?;

    info!(lot = %config.lot_name(), "parqueadero_shutdown_complete");
    Ok(())
}
