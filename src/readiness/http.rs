use anyhow::{Context, Result};
use tokio::time::{sleep, timeout, Duration, Instant};
use tracing::info;

use crate::health::HealthProber;

/// Ping until the application answers 200 or `wait` elapses.
///
/// Only used by the `probe --wait` command; the monitor never loops on the
/// prober itself.
pub async fn wait_healthy(prober: &mut HealthProber, wait: Duration, interval: Duration) -> Result<()> {
    info!(target: "health", url = %prober.url(), wait_secs = wait.as_secs(), "waiting for application");

    let start = Instant::now();
    timeout(wait, async {
        while !prober.ping().await {
            sleep(interval).await;
        }
    })
    .await
    .context("application did not become healthy in time")?;

    info!(target: "health", url = %prober.url(), elapsed_ms = start.elapsed().as_millis() as u64, "application healthy");
    Ok(())
}
