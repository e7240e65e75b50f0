use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::{Engine, Platform};
use crate::error::ReconcileError;
use crate::state::{Dimension, Status, StatusBoard};

impl Engine {
    /// Daemon-info probe. A recognized "cannot connect" message is
    /// `RuntimeUnreachable`; any other failure is `RuntimeCheck`.
    async fn probe_running(&self) -> Result<(), ReconcileError> {
        let out = self.capture(&self.binary, &["info"]).await?;
        if out.success() {
            return Ok(());
        }

        if self
            .unreachable_markers
            .iter()
            .any(|m| out.stderr.contains(m.as_str()))
        {
            return Err(ReconcileError::RuntimeUnreachable);
        }

        Err(ReconcileError::RuntimeCheck {
            command: format!("{} info", self.binary),
            code: out.code,
            stderr: out.stderr.trim().to_string(),
        })
    }

    /// Is the daemon reachable? Unreachable is `Ok(false)`; any other
    /// probe failure is returned as an error and marks the dimension Error.
    pub async fn check_running(&self, board: &mut StatusBoard) -> Result<bool, ReconcileError> {
        board.begin_check(Dimension::EngineRunning);
        match self.probe_running().await {
            Ok(()) => {
                board.set(Dimension::EngineRunning, Status::Ok);
                Ok(true)
            }
            Err(ReconcileError::RuntimeUnreachable) => {
                info!(target: "engine", "container engine daemon is not running");
                board.set(Dimension::EngineRunning, Status::Missing);
                Ok(false)
            }
            Err(e) => {
                warn!(target: "engine", error = %e, "engine runtime check failed");
                board.set(Dimension::EngineRunning, Status::Error);
                Err(e)
            }
        }
    }

    /// Launch the engine application and wait for the daemon to answer.
    ///
    /// Only macOS has a launch command. Everywhere else this fails at once
    /// with `UnsupportedPlatform`.
    pub async fn start_runtime(&self, board: &mut StatusBoard) -> Result<(), ReconcileError> {
        if self.platform != Platform::MacOs {
            warn!(target: "engine", platform = %self.platform, "cannot start the container engine on this platform, start it manually");
            board.set(Dimension::EngineRunning, Status::Error);
            return Err(ReconcileError::UnsupportedPlatform(self.platform.to_string()));
        }

        info!(target: "engine", "starting container engine");
        board.set(Dimension::EngineRunning, Status::Pending);

        let out = match self.capture("open", &["-a", "Docker"]).await {
            Ok(out) => out,
            Err(e) => {
                board.set(Dimension::EngineRunning, Status::Error);
                return Err(e);
            }
        };
        if !out.success() {
            board.set(Dimension::EngineRunning, Status::Error);
            return Err(ReconcileError::RuntimeCheck {
                command: "open -a Docker".to_string(),
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            });
        }

        let start = Instant::now();
        while start.elapsed() < self.start_timeout {
            sleep(self.start_poll).await;
            match self.probe_running().await {
                Ok(()) => {
                    info!(target: "engine", waited_secs = start.elapsed().as_secs(), "container engine is running");
                    board.set(Dimension::EngineRunning, Status::Ok);
                    return Ok(());
                }
                Err(e) => debug!(target: "engine", error = %e, "engine not up yet"),
            }
        }

        warn!(target: "engine", timeout_secs = self.start_timeout.as_secs(), "container engine did not start in time");
        board.set(Dimension::EngineRunning, Status::Error);
        Err(ReconcileError::RuntimeStartTimeout(self.start_timeout))
    }
}
