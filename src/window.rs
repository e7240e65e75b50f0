//! Window controller: surfaces the application or the engine download page.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::engine::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSignal {
    /// Open or refresh the application window at `url`.
    OpenApp { url: String },
    /// Ask the user to install the engine.
    OpenDownloadPage { url: String },
}

#[async_trait]
pub trait WindowController: Send {
    async fn open_app(&mut self, url: &str);
    async fn open_download_page(&mut self, url: &str);
}

/// Hands URLs to the platform's default opener.
pub struct DesktopWindow {
    platform: Platform,
}

impl DesktopWindow {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn open(&self, url: &str) {
        let (program, mut args): (&str, Vec<&str>) = match self.platform {
            Platform::MacOs => ("open", vec![]),
            Platform::Windows => ("cmd", vec!["/C", "start", ""]),
            Platform::Linux | Platform::Other(_) => ("xdg-open", vec![]),
        };
        args.push(url);

        match Command::new(program).args(&args).status().await {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(target: "window", url, %status, "opener exited unsuccessfully"),
            Err(e) => warn!(target: "window", url, error = %e, "failed to run opener"),
        }
    }
}

#[async_trait]
impl WindowController for DesktopWindow {
    async fn open_app(&mut self, url: &str) {
        info!(target: "window", url, "opening application");
        self.open(url).await;
    }

    async fn open_download_page(&mut self, url: &str) {
        info!(target: "window", url, "opening engine download page");
        self.open(url).await;
    }
}

/// Logs window signals instead of acting on them (`--no-browser`).
#[derive(Debug, Default)]
pub struct LogWindow;

#[async_trait]
impl WindowController for LogWindow {
    async fn open_app(&mut self, url: &str) {
        info!(target: "window", url, "application ready");
    }

    async fn open_download_page(&mut self, url: &str) {
        warn!(target: "window", url, "container engine not installed, download it from");
    }
}
