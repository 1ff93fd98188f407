//! iGrill → MQTT monitor daemon.
//!
//! Loads the configuration, connects the MQTT client, starts one polling
//! supervisor per configured device, and runs until Ctrl-C. Shutdown is
//! cooperative: the cancellation signal is broadcast once and every
//! supervisor winds down at its next check.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use igrill_mqtt::{BleConnector, Config, LinkConnector, MqttSink, PollingSupervisor, Result};

#[derive(Parser, Debug)]
#[command(
    name = "igrill-monitor",
    about = "Monitor Bluetooth iGrill devices and export readings to MQTT",
    version
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "igrill.toml")]
    config: PathBuf,

    /// Log filter, e.g. "info" or "igrill_mqtt=debug".
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load(&args.config)?;
    info!(
        devices = config.devices.len(),
        broker = %config.mqtt.host,
        "configuration loaded"
    );

    let sink = Arc::new(MqttSink::connect(&config.mqtt).await?);
    let connector: Arc<dyn LinkConnector> = Arc::new(BleConnector::new().await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut workers = Vec::with_capacity(config.devices.len());
    for device in config.devices.iter().cloned() {
        workers.push(
            PollingSupervisor::new(
                device,
                connector.clone(),
                sink.clone(),
                shutdown_rx.clone(),
            )
            .spawn(),
        );
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }

    info!("shutdown requested, signaling supervisors");
    shutdown_tx.send(true).ok();

    futures::future::join_all(workers).await;

    info!("all supervisors finished, exiting");
    Ok(())
}
