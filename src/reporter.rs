//! Status reporter: the single consumer of the event channel.
//!
//! Renders status transitions and process output through `tracing` and
//! passes window signals on to a [`WindowController`].

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::events::Event;
use crate::process::{OutputStream, ProcessEvent};
use crate::state::{Dimension, Status};
use crate::window::{WindowController, WindowSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Normal,
    Warning,
    Error,
}

/// stderr lines mentioning WARN or ECONNREFUSED are warnings (the app
/// polling its own backends during startup); other stderr is an error.
pub fn classify(event: &ProcessEvent) -> LineClass {
    match event.stream {
        OutputStream::Out => LineClass::Normal,
        OutputStream::Err if event.text.contains("WARN") || event.text.contains("ECONNREFUSED") => {
            LineClass::Warning
        }
        OutputStream::Err => LineClass::Error,
    }
}

/// Drop the compose service prefix (`omnitool-1  | `) from a log line.
pub fn strip_service_prefix<'a>(line: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return line;
    }
    line.strip_prefix(prefix).unwrap_or(line)
}

pub struct Reporter {
    window: Box<dyn WindowController>,
    strip_prefix: String,
    /// The app has been surfaced since it last became unhealthy.
    app_surfaced: bool,
}

impl Reporter {
    pub fn new(window: Box<dyn WindowController>, strip_prefix: impl Into<String>) -> Self {
        Self {
            window,
            strip_prefix: strip_prefix.into(),
            app_surfaced: false,
        }
    }

    pub async fn handle(&mut self, event: Event) {
        match event {
            Event::Status { dimension, status } => {
                info!(target: "status", "{} {}: {}", status.icon(), dimension, status);
                if dimension == Dimension::ApplicationHealthy
                    && matches!(status, Status::Missing | Status::Error)
                {
                    self.app_surfaced = false;
                }
            }
            Event::Output(line) => {
                let text = strip_service_prefix(&line.text, &self.strip_prefix);
                match classify(&line) {
                    LineClass::Normal => info!(target: "output", "{}", text),
                    LineClass::Warning => warn!(target: "output", "{}", text),
                    LineClass::Error => error!(target: "output", "{}", text),
                }
            }
            Event::Exited { program, code } => {
                info!(target: "output", "{} exited with code {}", program, code);
            }
            Event::Window(WindowSignal::OpenApp { url }) => {
                if !self.app_surfaced {
                    self.app_surfaced = true;
                    self.window.open_app(&url).await;
                }
            }
            Event::Window(WindowSignal::OpenDownloadPage { url }) => {
                self.window.open_download_page(&url).await;
            }
        }
    }

    /// Consume events until every sender is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Event>) {
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
    }
}
