use anyhow::{Context, Result};
use tracing::{error, info};

mod alert;
mod api;
mod config;
mod engine;
mod host;
mod logging;
mod models;
mod notifier;
mod probe;

use crate::config::MonitorConfig;
use crate::engine::Monitor;
use crate::notifier::SesNotifier;
use crate::probe::PlatformProbe;

const LOG_PATH: &str = "app.log";
const CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(LOG_PATH)?;

    run().await.inspect_err(|e| error!("Fatal: {:#}", e))
}

async fn run() -> Result<()> {
    let config = MonitorConfig::load(CONFIG_PATH)
        .with_context(|| format!("Failed to load {}", CONFIG_PATH))?;
    info!(service = %config.service_name, "Service watchdog starting");

    let listener = api::bind(config.api_port)
        .await
        .with_context(|| format!("Could not start server on port {}", config.api_port))?;
    tokio::spawn(api::start_server(listener));

    let probe = PlatformProbe::new(config.probe_timeout());
    let notifier = SesNotifier::new(&config.region, config.request_timeout()).await;

    Monitor::new(config, probe, notifier).run().await;

    Ok(())
}
