use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::reconcile::Reconciler;
use crate::state::ReconcileOutcome;

/// Self-healing supervisor around the reconciler.
///
/// One pass at startup, then forever: probe; healthy sleeps the steady
/// interval, unhealthy reconciles and sleeps steady or retry depending on
/// the pass. Passes are strictly sequential.
pub struct Monitor {
    reconciler: Reconciler,
    steady_interval: Duration,
    retry_interval: Duration,
    last_outcome: Option<ReconcileOutcome>,
}

impl Monitor {
    pub fn new(reconciler: Reconciler, steady_interval: Duration, retry_interval: Duration) -> Self {
        Self {
            reconciler,
            steady_interval,
            retry_interval,
            last_outcome: None,
        }
    }

    pub fn from_config(reconciler: Reconciler, config: &Config) -> Self {
        Self::new(reconciler, config.steady_interval(), config.retry_interval())
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn last_outcome(&self) -> Option<&ReconcileOutcome> {
        self.last_outcome.as_ref()
    }

    /// Initial pass. Returns how long to sleep before the first step.
    pub async fn startup(&mut self) -> Duration {
        info!(target: "monitor", "initial reconcile");
        self.reconcile().await
    }

    /// One iteration after a sleep. Returns the next sleep.
    pub async fn step(&mut self) -> Duration {
        if self.reconciler.probe_health().await {
            debug!(target: "monitor", "application healthy");
            return self.steady_interval;
        }
        info!(target: "monitor", "application unhealthy, reconciling");
        self.reconcile().await
    }

    /// Run until the process exits.
    pub async fn run(&mut self) {
        let mut delay = self.startup().await;
        loop {
            debug!(target: "monitor", delay_secs = delay.as_secs(), "sleeping");
            sleep(delay).await;
            delay = self.step().await;
        }
    }

    async fn reconcile(&mut self) -> Duration {
        let outcome = self.reconciler.reconcile().await;
        let delay = if outcome.succeeded {
            self.steady_interval
        } else {
            if outcome.error.as_ref().is_some_and(|e| e.needs_user()) {
                warn!(target: "monitor", detail = %outcome.detail, "waiting for user intervention");
            }
            self.retry_interval
        };
        self.last_outcome = Some(outcome);
        delay
    }
}
