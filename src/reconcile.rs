//! One reconcile pass: walk the preconditions in order, correct the first
//! unmet one, and stop there if it cannot be fixed.
//!
//! Order: EngineInstalled → EngineRunning → ImagePresent →
//! ApplicationHealthy. A pass never reports a later dimension while an
//! earlier one is unmet, and never fails itself; every problem becomes a
//! [`ReconcileOutcome`].

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{Engine, LaunchMode, Launcher, Platform};
use crate::error::ReconcileError;
use crate::events::EventHandle;
use crate::health::{HealthProbe, HealthProber};
use crate::process::ProcessRunner;
use crate::state::{Dimension, ReconcileOutcome, Status, StatusBoard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// Take corrective action for each unmet precondition.
    Correct,
    /// Report only. Every unmet precondition is a failure.
    Observe,
}

impl fmt::Display for PassMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassMode::Correct => f.write_str("correct"),
            PassMode::Observe => f.write_str("observe"),
        }
    }
}

type StageResult<T> = std::result::Result<T, (Dimension, ReconcileError)>;

pub struct Reconciler {
    engine: Engine,
    launcher: Launcher,
    prober: HealthProber,
    board: StatusBoard,
    install_poll: Duration,
    install_timeout: Duration,
    healthy_mode: LaunchMode,
}

impl Reconciler {
    pub fn new(
        config: &Config,
        runner: Arc<dyn ProcessRunner>,
        probe: Box<dyn HealthProbe>,
        events: EventHandle,
        platform: Platform,
    ) -> Result<Self> {
        Ok(Self {
            engine: Engine::new(config, runner.clone(), events.clone(), platform),
            launcher: Launcher::new(config, runner, events.clone())?,
            prober: HealthProber::new(probe, config.health.url.clone(), events.clone()),
            board: StatusBoard::new(events),
            install_poll: Duration::from_secs(config.install.poll_secs),
            install_timeout: Duration::from_secs(config.install.timeout_secs),
            healthy_mode: config.launch.healthy_mode,
        })
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// A corrective pass.
    pub async fn reconcile(&mut self) -> ReconcileOutcome {
        self.pass(PassMode::Correct).await
    }

    pub async fn pass(&mut self, mode: PassMode) -> ReconcileOutcome {
        debug!(target: "reconcile", %mode, "pass starting");
        let earlier_failure = self.launcher.take_session_failure();

        let mut outcome = match self.walk(mode == PassMode::Correct).await {
            Ok(detail) => ReconcileOutcome::success(detail),
            Err((dimension, error)) => ReconcileOutcome::failed(dimension, error),
        };
        if let Some(e) = earlier_failure {
            outcome.detail = format!("{} (previous compose session: {})", outcome.detail, e);
        }

        match &outcome.failed_dimension {
            None => info!(target: "reconcile", %mode, detail = %outcome.detail, "pass succeeded"),
            Some(dimension) => {
                warn!(target: "reconcile", %mode, %dimension, detail = %outcome.detail, "pass stopped")
            }
        }
        outcome
    }

    /// Probe health once, outside of a pass.
    pub async fn probe_health(&mut self) -> bool {
        self.prober.check(&mut self.board).await
    }

    async fn walk(&mut self, corrective: bool) -> StageResult<String> {
        self.ensure_installed(corrective).await?;
        self.ensure_running(corrective).await?;
        self.ensure_image(corrective).await?;
        self.ensure_healthy(corrective).await
    }

    async fn ensure_installed(&mut self, corrective: bool) -> StageResult<()> {
        if self.engine.check_installed(&mut self.board).await {
            return Ok(());
        }
        if !corrective {
            return Err((Dimension::EngineInstalled, ReconcileError::NotInstalled));
        }
        self.engine
            .wait_until_installed(&mut self.board, self.install_poll, self.install_timeout)
            .await
            .map_err(|e| (Dimension::EngineInstalled, e))
    }

    async fn ensure_running(&mut self, corrective: bool) -> StageResult<()> {
        let running = self
            .engine
            .check_running(&mut self.board)
            .await
            .map_err(|e| (Dimension::EngineRunning, e))?;
        if running {
            return Ok(());
        }
        if !corrective {
            return Err((Dimension::EngineRunning, ReconcileError::RuntimeUnreachable));
        }
        self.engine
            .start_runtime(&mut self.board)
            .await
            .map_err(|e| (Dimension::EngineRunning, e))
    }

    async fn ensure_image(&mut self, corrective: bool) -> StageResult<()> {
        if self.engine.check_image_present(&mut self.board).await {
            return Ok(());
        }
        if !corrective {
            return Err((
                Dimension::ImagePresent,
                ReconcileError::ImageMissing(self.engine.image().to_string()),
            ));
        }
        self.engine
            .pull_or_update(&mut self.board)
            .await
            .map_err(|e| (Dimension::ImagePresent, e))
    }

    async fn ensure_healthy(&mut self, corrective: bool) -> StageResult<String> {
        if self.prober.check(&mut self.board).await {
            if corrective {
                // Fire and forget: the app is already answering.
                match self.launcher.launch(self.healthy_mode).await {
                    Ok(outcome) => {
                        debug!(target: "reconcile", mode = %self.healthy_mode, ?outcome, "healthy launch done")
                    }
                    Err(e) => {
                        warn!(target: "reconcile", mode = %self.healthy_mode, error = %e, "launch against healthy app failed, ignoring")
                    }
                }
            }
            return Ok("application healthy".to_string());
        }

        if !corrective {
            return Err((
                Dimension::ApplicationHealthy,
                ReconcileError::HealthCheckFailed(format!("{} is not answering", self.prober.url())),
            ));
        }

        self.board.set(Dimension::ApplicationHealthy, Status::Pending);
        if let Err(e) = self.launcher.launch(LaunchMode::Up).await {
            self.board.set(Dimension::ApplicationHealthy, Status::Error);
            return Err((Dimension::ApplicationHealthy, e));
        }

        if self.prober.check(&mut self.board).await {
            Ok("application launched and healthy".to_string())
        } else {
            Err((
                Dimension::ApplicationHealthy,
                ReconcileError::HealthCheckFailed(format!(
                    "{} not answering after launch",
                    self.prober.url()
                )),
            ))
        }
    }
}
