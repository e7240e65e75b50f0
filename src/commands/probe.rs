use anyhow::{bail, Result};
use std::time::Duration;

use crate::cli::ProbeArgs;
use crate::config::Config;
use crate::events;
use crate::health::{HealthProber, HttpProbe};
use crate::readiness::wait_healthy;

pub async fn cmd_probe(config: Config, args: ProbeArgs) -> Result<()> {
    // Window signals are meaningless for a one-off probe
    let (events, rx) = events::channel();
    drop(rx);

    let probe = HttpProbe::new(config.health_timeout())?;
    let mut prober = HealthProber::new(Box::new(probe), config.health.url.clone(), events);

    let healthy = match args.wait {
        Some(secs) => wait_healthy(&mut prober, Duration::from_secs(secs), Duration::from_secs(1))
            .await
            .is_ok(),
        None => prober.ping().await,
    };

    if !healthy {
        bail!("{} is unhealthy", config.health.url);
    }
    println!("{} is healthy", config.health.url);
    Ok(())
}
