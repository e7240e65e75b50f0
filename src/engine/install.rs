use tokio::time::{sleep, Duration, Instant};
use tracing::{info, warn};

use super::Engine;
use crate::error::ReconcileError;
use crate::state::{Dimension, Status, StatusBoard};

impl Engine {
    /// Version probe without touching the board. Any failure, including a
    /// missing binary, means "not installed".
    async fn probe_installed(&self) -> bool {
        match self.capture(&self.binary, &["--version"]).await {
            Ok(out) if out.success() => {
                let version = out.stdout.lines().next().unwrap_or("installed").trim().to_string();
                info!(target: "engine", %version, "container engine installed");
                true
            }
            Ok(out) => {
                warn!(target: "engine", code = out.code, "version probe failed, engine not installed");
                false
            }
            Err(e) => {
                warn!(target: "engine", error = %e, "container engine not installed");
                false
            }
        }
    }

    /// Is the engine installed? Reports Checking → Ok | Missing, never Error.
    pub async fn check_installed(&self, board: &mut StatusBoard) -> bool {
        board.begin_check(Dimension::EngineInstalled);
        let installed = self.probe_installed().await;
        board.set(
            Dimension::EngineInstalled,
            if installed { Status::Ok } else { Status::Missing },
        );
        installed
    }

    /// Open the download page and poll until the user has installed the
    /// engine. On timeout reports Error and returns `NotInstalled`.
    pub async fn wait_until_installed(
        &self,
        board: &mut StatusBoard,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<(), ReconcileError> {
        info!(
            target: "engine",
            poll_secs = poll_interval.as_secs(),
            timeout_secs = timeout.as_secs(),
            "waiting for the container engine to be installed"
        );
        self.events.open_download_page(&self.download_url);
        board.set(Dimension::EngineInstalled, Status::Pending);

        let start = Instant::now();
        loop {
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!(target: "engine", waited_secs = elapsed.as_secs(), "gave up waiting for engine install");
                board.set(Dimension::EngineInstalled, Status::Error);
                return Err(ReconcileError::NotInstalled);
            }

            sleep(poll_interval.min(timeout - elapsed)).await;

            if self.probe_installed().await {
                info!(target: "engine", waited_secs = start.elapsed().as_secs(), "container engine installed after waiting");
                board.set(Dimension::EngineInstalled, Status::Ok);
                return Ok(());
            }
        }
    }
}
