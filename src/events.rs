//! Event channel from the reconciler to its collaborators.
//!
//! Checkers, the launcher and the prober never talk to the status reporter
//! or the window controller directly. They push [`Event`]s through an
//! [`EventHandle`]; a single consumer task (see [`crate::reporter`]) fans
//! them out.

use tokio::sync::mpsc;

use crate::process::ProcessEvent;
use crate::state::{Dimension, Status};
use crate::window::WindowSignal;

const CHANNEL_CAPACITY: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A monitored dimension changed value.
    Status { dimension: Dimension, status: Status },
    /// One line of output from a streaming invocation.
    Output(ProcessEvent),
    /// A streaming invocation finished.
    Exited { program: String, code: i32 },
    /// Something for the window controller.
    Window(WindowSignal),
}

/// Clonable sender half. Every method drops the event if the channel is
/// full or the consumer is gone; reporting never blocks reconciliation.
#[derive(Clone, Debug)]
pub struct EventHandle {
    tx: mpsc::Sender<Event>,
}

impl EventHandle {
    pub fn emit(&self, event: Event) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.tx.try_send(event) {
            tracing::debug!(target: "events", ?event, "event channel full, dropping");
        }
    }

    pub fn status(&self, dimension: Dimension, status: Status) {
        self.emit(Event::Status { dimension, status });
    }

    pub fn output(&self, event: ProcessEvent) {
        self.emit(Event::Output(event));
    }

    pub fn exited(&self, program: &str, code: i32) {
        self.emit(Event::Exited {
            program: program.to_string(),
            code,
        });
    }

    pub fn open_app(&self, url: &str) {
        self.emit(Event::Window(WindowSignal::OpenApp {
            url: url.to_string(),
        }));
    }

    pub fn open_download_page(&self, url: &str) {
        self.emit(Event::Window(WindowSignal::OpenDownloadPage {
            url: url.to_string(),
        }));
    }
}

/// Create an (EventHandle, receiver) pair. Hand the receiver to the
/// reporter task.
pub fn channel() -> (EventHandle, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    (EventHandle { tx }, rx)
}

/// Drain everything currently queued without waiting.
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::OutputStream;

    #[tokio::test]
    async fn test_status_event() {
        let (handle, mut rx) = channel();

        handle.status(Dimension::EngineRunning, Status::Pending);

        match rx.recv().await.unwrap() {
            Event::Status { dimension, status } => {
                assert_eq!(dimension, Dimension::EngineRunning);
                assert_eq!(status, Status::Pending);
            }
            other => panic!("expected Status event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_output_and_exit_order() {
        let (handle, mut rx) = channel();

        handle.output(ProcessEvent::new(OutputStream::Out, "pulling fs layer"));
        handle.exited("docker", 0);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Output(_)));
        assert_eq!(
            events[1],
            Event::Exited {
                program: "docker".into(),
                code: 0
            }
        );
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (handle, rx) = channel();
        drop(rx);
        // Must not panic
        handle.open_app("http://127.0.0.1:1688");
    }
}
