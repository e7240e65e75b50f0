use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "omniwatch",
    version,
    about = "Keeps a local containerized app installed, running and healthy"
)]
pub struct Cli {
    /// Config file (default: XDG config dir, then /etc/omniwatch)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Supervise the application until interrupted
    Run,
    /// Run a single reconcile pass and print the result
    Check(CheckArgs),
    /// Probe the health endpoint once
    Probe(ProbeArgs),
    /// Print the effective configuration
    Config,
}

/// Settings that override the config file.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Compose manifest for the application
    #[arg(long, global = true)]
    pub compose_file: Option<PathBuf>,

    /// Application image reference (e.g., omnitool/omnitool:latest)
    #[arg(long, global = true)]
    pub image: Option<String>,

    /// Health endpoint URL
    #[arg(long, global = true)]
    pub health_url: Option<String>,

    /// Launch mode used when the application is already healthy
    #[arg(long, value_enum, global = true)]
    pub healthy_mode: Option<LaunchModeOpt>,

    /// Log window signals instead of opening a browser
    #[arg(long, global = true)]
    pub no_browser: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Report only; take no corrective action
    #[arg(long)]
    pub observe: bool,

    /// Print the board and outcome as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Keep probing for up to this many seconds
    #[arg(long)]
    pub wait: Option<u64>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum LaunchModeOpt {
    Restart,
    Attach,
}
