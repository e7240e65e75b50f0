// Shared fakes for reconcile and monitor tests.
//
// Nothing here touches a real container engine: FakeRunner answers each
// command line from a script and FakeProbe answers health probes from a
// queue. Both record what was asked of them.

#![allow(dead_code)]

use async_trait::async_trait;
use omniwatch::config::Config;
use omniwatch::engine::Platform;
use omniwatch::error::ReconcileError;
use omniwatch::events::{self, Event};
use omniwatch::health::HealthProbe;
use omniwatch::process::{command_line, LineSink, OutputStream, ProcessEvent, ProcessOutput, ProcessRunner};
use omniwatch::reconcile::Reconciler;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration, Instant};

pub const IMAGE: &str = "omnitool/omnitool:latest";
pub const HEALTH_URL: &str = "http://127.0.0.1:1688";

pub const VERSION: &str = "docker --version";
pub const INFO: &str = "docker info";
pub const IMAGES: &str = "docker images -q omnitool/omnitool:latest";
pub const PULL: &str = "docker pull omnitool/omnitool:latest";
pub const COMPOSE_UP: &str = "docker compose -f docker-compose.yml up";
pub const COMPOSE_RESTART: &str = "docker compose -f docker-compose.yml restart";
pub const OPEN_DOCKER: &str = "open -a Docker";

/// How a scripted command behaves.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Streamed to the sink, one event per entry.
    pub lines: Vec<ProcessEvent>,
    /// Delay between the last line and exit.
    pub runtime: Duration,
    /// Never exit after the lines are sent.
    pub hold: bool,
}

impl Script {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn code(code: i32) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }

    pub fn stdout(text: &str) -> Self {
        Self {
            stdout: text.to_string(),
            ..Default::default()
        }
    }

    pub fn failing(code: i32, stderr: &str) -> Self {
        Self {
            code,
            stderr: stderr.to_string(),
            ..Default::default()
        }
    }

    pub fn line(mut self, text: &str) -> Self {
        self.lines.push(ProcessEvent::new(OutputStream::Out, text));
        self
    }

    pub fn err_line(mut self, text: &str) -> Self {
        self.lines.push(ProcessEvent::new(OutputStream::Err, text));
        self
    }

    pub fn runs_for(mut self, runtime: Duration) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn held(mut self) -> Self {
        self.hold = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub command: String,
    pub at: Instant,
}

/// Scripted process runner. Each command line has a queue of scripts; the
/// last one repeats. Unscripted commands fail to spawn, like a missing
/// binary.
#[derive(Default)]
pub struct FakeRunner {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, command: &str, script: Script) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(script);
        self
    }

    /// Replace every script for `command`.
    pub fn set(&self, command: &str, script: Script) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(command.to_string(), VecDeque::from([script]));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.command == command).count()
    }

    pub fn call_times(&self, command: &str) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|c| c.command == command)
            .map(|c| c.at)
            .collect()
    }

    fn next_script(&self, command: &str) -> Option<Script> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(command)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        sink: Option<LineSink>,
    ) -> Result<ProcessOutput, ReconcileError> {
        let command = command_line(program, args);
        self.calls.lock().unwrap().push(Call {
            command: command.clone(),
            at: Instant::now(),
        });

        let Some(script) = self.next_script(&command) else {
            return Err(ReconcileError::Spawn {
                program: program.to_string(),
                reason: "No such file or directory (os error 2)".to_string(),
            });
        };

        if let Some(sink) = &sink {
            for line in &script.lines {
                let _ = sink.send(line.clone());
            }
        }
        if script.hold {
            std::future::pending::<()>().await;
        }
        if !script.runtime.is_zero() {
            sleep(script.runtime).await;
        }

        if sink.is_some() {
            Ok(ProcessOutput {
                code: script.code,
                ..Default::default()
            })
        } else {
            Ok(ProcessOutput {
                code: script.code,
                stdout: script.stdout,
                stderr: script.stderr,
            })
        }
    }
}

/// Health probe answering from a queue of results; the last one repeats.
#[derive(Clone)]
pub struct FakeProbe {
    answers: Arc<Mutex<VecDeque<bool>>>,
    probes: Arc<Mutex<usize>>,
}

impl FakeProbe {
    pub fn sequence(answers: &[bool]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.iter().copied().collect())),
            probes: Arc::new(Mutex::new(0)),
        }
    }

    pub fn healthy() -> Self {
        Self::sequence(&[true])
    }

    pub fn down() -> Self {
        Self::sequence(&[false])
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.answers.lock().unwrap() = VecDeque::from([healthy]);
    }

    pub fn probes(&self) -> usize {
        *self.probes.lock().unwrap()
    }
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn probe(&self, url: &str) -> Result<(), ReconcileError> {
        *self.probes.lock().unwrap() += 1;
        let healthy = {
            let mut answers = self.answers.lock().unwrap();
            if answers.len() > 1 {
                answers.pop_front().unwrap_or(false)
            } else {
                answers.front().copied().unwrap_or(false)
            }
        };
        if healthy {
            Ok(())
        } else {
            Err(ReconcileError::HealthCheckFailed(format!(
                "cannot connect to {}",
                url
            )))
        }
    }
}

/// Defaults with timeouts short enough for paused-clock tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.install.poll_secs = 1;
    config.install.timeout_secs = 5;
    config.engine.start_timeout_secs = 5;
    config.launch.grace_secs = 3;
    config.monitor.steady_secs = 30;
    config.monitor.retry_secs = 10;
    config
}

/// Script an installed, running engine with the image already cached.
pub fn engine_ready(runner: &FakeRunner) {
    runner
        .on(VERSION, Script::stdout("Docker version 27.3.1, build ce12230\n"))
        .on(INFO, Script::stdout("Server Version: 27.3.1\n"))
        .on(IMAGES, Script::stdout("3f2a9c1b7d4e\n"));
}

pub fn build(
    config: &Config,
    runner: Arc<FakeRunner>,
    probe: FakeProbe,
    platform: Platform,
) -> (Reconciler, mpsc::Receiver<Event>) {
    let (handle, rx) = events::channel();
    let reconciler = Reconciler::new(config, runner, Box::new(probe), handle, platform)
        .expect("build reconciler");
    (reconciler, rx)
}

pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    events::drain(rx)
}
