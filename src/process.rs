//! Process invoker: runs engine commands, optionally streaming their output.

use async_trait::async_trait;
use serde::Serialize;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ReconcileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Out,
    Err,
}

/// One line of stdout or stderr from an invoked command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessEvent {
    pub stream: OutputStream,
    pub text: String,
}

impl ProcessEvent {
    pub fn new(stream: OutputStream, text: impl Into<String>) -> Self {
        Self {
            stream,
            text: text.into(),
        }
    }
}

/// Receives lines as they are read. Dropping the receiver is allowed; the
/// process keeps running and lines are discarded.
pub type LineSink = mpsc::UnboundedSender<ProcessEvent>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub code: i32,
    /// Captured stdout. Empty when the call was streamed.
    pub stdout: String,
    /// Captured stderr. Empty when the call was streamed.
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs one external command per call. Never retries.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` to completion.
    ///
    /// With a sink, every stdout/stderr line is sent as it arrives and the
    /// returned output carries only the exit code. Without one, output is
    /// captured.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        sink: Option<LineSink>,
    ) -> Result<ProcessOutput, ReconcileError>;
}

/// Runner backed by real OS processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        sink: Option<LineSink>,
    ) -> Result<ProcessOutput, ReconcileError> {
        debug!(target: "process", command = %command_line(program, args), streaming = sink.is_some(), "spawning");

        let spawn_error = |e: std::io::Error| ReconcileError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        };

        let Some(sink) = sink else {
            let output = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(spawn_error)?;
            return Ok(ProcessOutput {
                code: exit_code(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        if let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) {
            let forwarded = tokio::try_join!(
                forward_lines(stdout, OutputStream::Out, &sink),
                forward_lines(stderr, OutputStream::Err, &sink),
            );
            // A child left writing into an unread pipe would never exit
            if let Err(e) = forwarded {
                warn!(target: "process", program, error = %e, "reading output failed, killing process");
                let _ = child.start_kill();
            }
        }

        let status = child.wait().await.map_err(spawn_error)?;
        Ok(ProcessOutput {
            code: exit_code(status),
            ..Default::default()
        })
    }
}

/// Send every newline-terminated line of `reader` to `sink` until EOF.
/// Bytes that are not UTF-8 are replaced, never fatal.
async fn forward_lines<R>(reader: R, stream: OutputStream, sink: &LineSink) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(mut segment) = segments.next_segment().await? {
        if segment.last() == Some(&b'\r') {
            segment.pop();
        }
        let text = String::from_utf8_lossy(&segment).into_owned();
        let _ = sink.send(ProcessEvent::new(stream, text));
    }
    Ok(())
}

/// Exit code of a finished process. A process killed by signal N reports
/// 128 + N, the way a shell does.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
