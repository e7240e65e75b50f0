//! Container engine checkers and correctors.
//!
//! [`Engine`] covers the first three dimensions (installed, running, image
//! present). [`Launcher`] drives the compose group. Both shell out through
//! a shared [`ProcessRunner`].

pub mod compose;
pub mod image;
pub mod install;
pub mod runtime;

pub use compose::{LaunchMode, LaunchOutcome, Launcher};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::ReconcileError;
use crate::events::EventHandle;
use crate::process::{ProcessOutput, ProcessRunner};

/// Host platform, as far as starting the engine is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other(String),
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => f.write_str("macos"),
            Platform::Linux => f.write_str("linux"),
            Platform::Windows => f.write_str("windows"),
            Platform::Other(os) => f.write_str(os),
        }
    }
}

/// Installation, runtime and image checks against the engine CLI.
pub struct Engine {
    runner: Arc<dyn ProcessRunner>,
    events: EventHandle,
    platform: Platform,
    binary: String,
    image: String,
    unreachable_markers: Vec<String>,
    start_timeout: Duration,
    start_poll: Duration,
    download_url: String,
}

impl Engine {
    pub fn new(
        config: &Config,
        runner: Arc<dyn ProcessRunner>,
        events: EventHandle,
        platform: Platform,
    ) -> Self {
        Self {
            runner,
            events,
            platform,
            binary: config.engine.binary.clone(),
            image: config.engine.image.clone(),
            unreachable_markers: config.engine.unreachable_markers.clone(),
            start_timeout: Duration::from_secs(config.engine.start_timeout_secs),
            start_poll: Duration::from_secs(1),
            download_url: config.install.download_url.clone(),
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    async fn capture(&self, program: &str, args: &[&str]) -> Result<ProcessOutput, ReconcileError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.runner.run(program, &args, None).await
    }

    /// Run with a sink, forwarding each line to the output channel as it
    /// arrives, then emit the exit event.
    async fn stream(&self, program: &str, args: &[&str]) -> Result<i32, ReconcileError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let run = self.runner.run(program, &args, Some(tx));
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                biased;
                Some(line) = rx.recv() => self.events.output(line),
                result = &mut run => break result,
            }
        };
        while let Ok(line) = rx.try_recv() {
            self.events.output(line);
        }

        let output = result?;
        self.events.exited(program, output.code);
        Ok(output.code)
    }
}
