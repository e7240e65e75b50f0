use anyhow::Result;
use clap::Parser;
use omniwatch::cli::{self, Commands};
use omniwatch::commands;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Logs go to stderr so `check --json` and `config` keep stdout clean.
    // Colors only when stderr is a TTY.
    let use_color = atty::is(atty::Stream::Stderr);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(true)
        .with_ansi(use_color)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    // Handle errors
    if let Err(e) = &result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }

    result
}

async fn run(cli: cli::Cli) -> Result<()> {
    let config = commands::common::load(cli.config.as_deref(), &cli.overrides)?;

    // Dispatch to appropriate command handler
    match cli.cmd {
        Commands::Run => commands::cmd_run(config).await,
        Commands::Check(args) => commands::cmd_check(config, args).await,
        Commands::Probe(args) => commands::cmd_probe(config, args).await,
        Commands::Config => commands::cmd_config(&config),
    }
}
