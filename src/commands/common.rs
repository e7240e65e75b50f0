//! Wiring shared by the commands: config, reconciler and reporter.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cli::Overrides;
use crate::config::{load_config, Config};
use crate::engine::Platform;
use crate::events::{Event, EventHandle};
use crate::health::HttpProbe;
use crate::process::SystemRunner;
use crate::reconcile::Reconciler;
use crate::reporter::Reporter;
use crate::window::{DesktopWindow, LogWindow, WindowController};

/// Load the config file and apply command-line overrides.
pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);
    config.validate().context("validating effective config")?;
    Ok(config)
}

/// Reconciler against the real engine CLI and health endpoint.
pub fn build_reconciler(config: &Config, events: EventHandle) -> Result<Reconciler> {
    let probe = HttpProbe::new(config.health_timeout())?;
    Reconciler::new(
        config,
        Arc::new(SystemRunner),
        Box::new(probe),
        events,
        Platform::current(),
    )
}

pub fn spawn_reporter(config: &Config, rx: mpsc::Receiver<Event>) -> JoinHandle<()> {
    let window: Box<dyn WindowController> = if config.ui.open_browser {
        Box::new(DesktopWindow::new(Platform::current()))
    } else {
        Box::new(LogWindow)
    };
    let reporter = Reporter::new(window, config.ui.strip_prefix.clone());
    tokio::spawn(reporter.run(rx))
}

/// Resolves on SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down");
    Ok(())
}
