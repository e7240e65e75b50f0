use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ReconcileError;
use crate::events::EventHandle;
use crate::process::{command_line, ProcessEvent, ProcessOutput, ProcessRunner};
use crate::readiness::ReadinessMarkers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Create and start the group from scratch.
    Up,
    /// Restart the running group.
    Restart,
    /// Attach to the running group without recreating containers.
    Attach,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchMode::Up => f.write_str("up"),
            LaunchMode::Restart => f.write_str("restart"),
            LaunchMode::Attach => f.write_str("attach"),
        }
    }
}

/// Why `launch` returned. None of these mean the service is healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The compose process finished with exit code 0.
    Exited,
    /// A readiness marker appeared; compose keeps running.
    MarkerSeen,
    /// The grace period ran out; compose keeps running.
    StillRunning,
}

/// Output forwarding for a compose process that outlived its `launch`.
struct Session {
    process: AbortHandle,
    forwarder: JoinHandle<()>,
}

/// Starts the application's container group through compose.
pub struct Launcher {
    runner: Arc<dyn ProcessRunner>,
    events: EventHandle,
    program: String,
    base_args: Vec<String>,
    compose_file: PathBuf,
    markers: ReadinessMarkers,
    grace: Duration,
    app_url: String,
    session: Option<Session>,
    /// Failing exit code of a session that ended after `launch` returned.
    session_failure: Arc<Mutex<Option<i32>>>,
}

impl Launcher {
    pub fn new(
        config: &Config,
        runner: Arc<dyn ProcessRunner>,
        events: EventHandle,
    ) -> anyhow::Result<Self> {
        let (program, base_args) = config.compose_argv()?;
        Ok(Self {
            runner,
            events,
            program,
            base_args,
            compose_file: config.engine.compose_file.clone(),
            markers: ReadinessMarkers::new(config.launch.readiness_markers.iter().cloned()),
            grace: Duration::from_secs(config.launch.grace_secs),
            app_url: config.health.url.clone(),
            session: None,
            session_failure: Arc::new(Mutex::new(None)),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for `mode`, after the program name.
    pub fn args_for(&self, mode: LaunchMode) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.push("-f".to_string());
        args.push(self.compose_file.display().to_string());
        match mode {
            LaunchMode::Up => args.push("up".to_string()),
            LaunchMode::Restart => args.push("restart".to_string()),
            LaunchMode::Attach => {
                args.push("up".to_string());
                args.push("--no-recreate".to_string());
            }
        }
        args
    }

    /// Start a launch attempt and stream its output.
    ///
    /// Returns once compose exits, a readiness marker shows up, or the grace
    /// period elapses, whichever is first. In the latter two cases the
    /// process keeps running and its output keeps flowing. Exit code 0 only
    /// means the attempt was made; non-zero is `ComposeFailed`. A non-zero
    /// exit after return is kept for [`Launcher::take_session_failure`].
    pub async fn launch(&mut self, mode: LaunchMode) -> Result<LaunchOutcome, ReconcileError> {
        self.detach_previous();

        let args = self.args_for(mode);
        info!(target: "compose", %mode, command = %command_line(&self.program, &args), "launching");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let runner = self.runner.clone();
        let program = self.program.clone();
        let mut process = tokio::spawn(async move { runner.run(&program, &args, Some(tx)).await });

        let grace = sleep(self.grace);
        tokio::pin!(grace);
        let mut signalled = false;

        let outcome = loop {
            tokio::select! {
                biased;
                Some(line) = rx.recv() => {
                    if forward_line(&self.events, &self.markers, &self.app_url, line, &mut signalled) {
                        break LaunchOutcome::MarkerSeen;
                    }
                }
                result = &mut process => {
                    while let Ok(line) = rx.try_recv() {
                        forward_line(&self.events, &self.markers, &self.app_url, line, &mut signalled);
                    }
                    let output = flatten(&self.program, result)?;
                    self.events.exited(&self.program, output.code);
                    if output.code != 0 {
                        warn!(target: "compose", %mode, code = output.code, "compose failed");
                        return Err(ReconcileError::ComposeFailed(output.code));
                    }
                    info!(target: "compose", %mode, "compose exited");
                    return Ok(LaunchOutcome::Exited);
                }
                _ = &mut grace => break LaunchOutcome::StillRunning,
            }
        };

        debug!(target: "compose", %mode, ?outcome, "compose still running, forwarding output in background");
        let events = self.events.clone();
        let markers = self.markers.clone();
        let app_url = self.app_url.clone();
        let program = self.program.clone();
        let failure = self.session_failure.clone();
        let abort = process.abort_handle();
        let forwarder = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                forward_line(&events, &markers, &app_url, line, &mut signalled);
            }
            match flatten(&program, process.await) {
                Ok(output) => {
                    events.exited(&program, output.code);
                    if output.code == 0 {
                        info!(target: "compose", "compose exited");
                    } else {
                        warn!(target: "compose", error = %ReconcileError::ComposeFailed(output.code), "compose session ended");
                        if let Ok(mut slot) = failure.lock() {
                            *slot = Some(output.code);
                        }
                    }
                }
                Err(e) => warn!(target: "compose", error = %e, "compose session ended"),
            }
        });
        self.session = Some(Session {
            process: abort,
            forwarder,
        });

        Ok(outcome)
    }

    /// Whether a previous launch is still streaming output.
    pub fn has_live_session(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.forwarder.is_finished())
    }

    /// The failure of a background session since the last call, if any.
    pub fn take_session_failure(&self) -> Option<ReconcileError> {
        let code = self.session_failure.lock().ok()?.take()?;
        Some(ReconcileError::ComposeFailed(code))
    }

    /// Stop following the previous compose process. The process itself is
    /// killed; containers it started are left alone.
    fn detach_previous(&mut self) {
        if let Some(session) = self.session.take() {
            if !session.forwarder.is_finished() {
                info!(target: "compose", "superseding previous compose session");
            }
            session.process.abort();
            session.forwarder.abort();
        }
    }
}

impl Drop for Launcher {
    fn drop(&mut self) {
        self.detach_previous();
    }
}

/// Forward one line and scan it for a readiness marker. Returns true the
/// first time a marker is seen; the window controller is signalled then.
fn forward_line(
    events: &EventHandle,
    markers: &ReadinessMarkers,
    app_url: &str,
    line: ProcessEvent,
    signalled: &mut bool,
) -> bool {
    let marker = if *signalled {
        None
    } else {
        markers.find(&line.text).map(str::to_string)
    };
    events.output(line);

    match marker {
        Some(marker) => {
            info!(target: "compose", %marker, "readiness marker seen");
            *signalled = true;
            events.open_app(app_url);
            true
        }
        None => false,
    }
}

fn flatten(
    program: &str,
    result: Result<Result<ProcessOutput, ReconcileError>, tokio::task::JoinError>,
) -> Result<ProcessOutput, ReconcileError> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(ReconcileError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        }),
    }
}
