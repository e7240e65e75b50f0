use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ReconcileError;
use crate::events::EventHandle;
use crate::state::{Dimension, Status, StatusBoard};

/// Repeat identical failure warnings at most this often.
const FAILURE_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// A single liveness probe. Implementations must not retry.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), ReconcileError>;
}

/// HTTP GET probe. Exactly 200 is healthy.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building health check client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, url: &str) -> Result<(), ReconcileError> {
        match self.client.get(url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => Ok(()),
            Ok(resp) => Err(ReconcileError::HealthCheckFailed(format!(
                "{} returned {}",
                url,
                resp.status()
            ))),
            Err(e) if e.is_timeout() => Err(ReconcileError::HealthCheckFailed(format!(
                "{} timed out",
                url
            ))),
            Err(e) if e.is_connect() => Err(ReconcileError::HealthCheckFailed(format!(
                "cannot connect to {}: {}",
                url, e
            ))),
            Err(e) => Err(ReconcileError::HealthCheckFailed(format!(
                "request to {} failed: {}",
                url, e
            ))),
        }
    }
}

/// Probes the application once per call and classifies the result.
///
/// Every unhealthy outcome (bad status, refused, timeout, DNS) looks the
/// same to callers. Retrying and backoff belong to the monitor.
pub struct HealthProber {
    probe: Box<dyn HealthProbe>,
    url: String,
    events: EventHandle,
    last_failure_log: Option<Instant>,
}

impl HealthProber {
    pub fn new(probe: Box<dyn HealthProbe>, url: impl Into<String>, events: EventHandle) -> Self {
        Self {
            probe,
            url: url.into(),
            events,
            last_failure_log: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One probe. On healthy, asks the window controller to surface the
    /// application.
    pub async fn ping(&mut self) -> bool {
        match self.probe.probe(&self.url).await {
            Ok(()) => {
                debug!(target: "health", url = %self.url, "health check passed");
                self.last_failure_log = None;
                self.events.open_app(&self.url);
                true
            }
            Err(e) => {
                let should_log = match self.last_failure_log {
                    None => true,
                    Some(last) => last.elapsed() >= FAILURE_LOG_INTERVAL,
                };
                if should_log {
                    warn!(target: "health", url = %self.url, error = %e, "health check failed");
                    self.last_failure_log = Some(Instant::now());
                } else {
                    debug!(target: "health", url = %self.url, error = %e, "health check failed");
                }
                false
            }
        }
    }

    /// Probe and record the result on the ApplicationHealthy dimension.
    pub async fn check(&mut self, board: &mut StatusBoard) -> bool {
        board.begin_check(Dimension::ApplicationHealthy);
        let healthy = self.ping().await;
        board.set(
            Dimension::ApplicationHealthy,
            if healthy { Status::Ok } else { Status::Missing },
        );
        healthy
    }
}
