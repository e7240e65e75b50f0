use anyhow::Result;
use tracing::info;

use super::common::{build_reconciler, shutdown_signal, spawn_reporter};
use crate::config::Config;
use crate::events;
use crate::monitor::Monitor;

pub async fn cmd_run(config: Config) -> Result<()> {
    info!(
        image = %config.engine.image,
        compose_file = %config.engine.compose_file.display(),
        health_url = %config.health.url,
        "starting omniwatch"
    );

    let (events, rx) = events::channel();
    let reporter = spawn_reporter(&config, rx);
    let reconciler = build_reconciler(&config, events)?;
    let mut monitor = Monitor::from_config(reconciler, &config);

    tokio::select! {
        result = shutdown_signal() => result?,
        _ = monitor.run() => {}
    }

    drop(monitor);
    reporter.abort();
    Ok(())
}
