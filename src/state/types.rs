use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ReconcileError;

/// One precondition of a healthy application, in reconcile order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    EngineInstalled,
    EngineRunning,
    ImagePresent,
    ApplicationHealthy,
}

impl Dimension {
    /// All dimensions in the order a pass walks them.
    pub const ALL: [Dimension; 4] = [
        Dimension::EngineInstalled,
        Dimension::EngineRunning,
        Dimension::ImagePresent,
        Dimension::ApplicationHealthy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::EngineInstalled => "engine installed",
            Dimension::EngineRunning => "engine running",
            Dimension::ImagePresent => "image present",
            Dimension::ApplicationHealthy => "application healthy",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Unknown,
    Checking,
    /// A corrective action is in progress.
    Pending,
    Ok,
    Missing,
    Error,
}

impl Status {
    /// Icon shown next to each dimension in the manager panel.
    pub fn icon(self) -> &'static str {
        match self {
            Status::Unknown => "❔",
            Status::Checking => "👀",
            Status::Pending => "😴",
            Status::Ok => "☑️",
            Status::Missing => "❌",
            Status::Error => "⚠️",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unknown => "unknown",
            Status::Checking => "checking",
            Status::Pending => "pending",
            Status::Ok => "ok",
            Status::Missing => "missing",
            Status::Error => "error",
        };
        f.pad(s)
    }
}

/// Result of one reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub succeeded: bool,
    pub failed_dimension: Option<Dimension>,
    pub detail: String,
    pub error: Option<ReconcileError>,
}

impl ReconcileOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            failed_dimension: None,
            detail: detail.into(),
            error: None,
        }
    }

    pub fn failed(dimension: Dimension, error: ReconcileError) -> Self {
        Self {
            succeeded: false,
            failed_dimension: Some(dimension),
            detail: error.to_string(),
            error: Some(error),
        }
    }
}
