use anyhow::{bail, Result};
use serde::Serialize;
use std::time::Duration;

use super::common::{build_reconciler, spawn_reporter};
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::events;
use crate::reconcile::PassMode;
use crate::state::{Dimension, DimensionReport};

#[derive(Debug, Serialize)]
struct CheckReport {
    succeeded: bool,
    failed_dimension: Option<Dimension>,
    detail: String,
    dimensions: Vec<DimensionReport>,
}

pub async fn cmd_check(config: Config, args: CheckArgs) -> Result<()> {
    let mode = if args.observe {
        PassMode::Observe
    } else {
        PassMode::Correct
    };

    let (events, rx) = events::channel();
    let reporter = spawn_reporter(&config, rx);
    let mut reconciler = build_reconciler(&config, events)?;

    let outcome = reconciler.pass(mode).await;
    let report = CheckReport {
        succeeded: outcome.succeeded,
        failed_dimension: outcome.failed_dimension,
        detail: outcome.detail.clone(),
        dimensions: reconciler.board().report(),
    };

    // Let the reporter drain before printing
    drop(reconciler);
    let _ = tokio::time::timeout(Duration::from_secs(2), reporter).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:<4} {:<22} {:<10}", "", "DIMENSION", "STATUS");
        println!("{}", "-".repeat(40));
        for row in &report.dimensions {
            println!("{:<4} {:<22} {:<10}", row.icon, row.dimension, row.status);
        }
        println!();
        println!("{}", report.detail);
    }

    if let Some(dimension) = outcome.failed_dimension {
        bail!("reconcile stopped at {}: {}", dimension, outcome.detail);
    }
    Ok(())
}
