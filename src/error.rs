use std::time::Duration;

/// Failure kinds produced by the checkers and correctors.
///
/// Every stage converts its own process or network failure into one of
/// these before returning, so a reconcile pass never sees a raw I/O error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("container engine is not installed")]
    NotInstalled,

    #[error("container engine daemon is unreachable")]
    RuntimeUnreachable,

    #[error("engine probe `{command}` failed with exit code {code}: {stderr}")]
    RuntimeCheck {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("container engine did not come up within {0:?}")]
    RuntimeStartTimeout(Duration),

    #[error("starting the container engine is not supported on {0}")]
    UnsupportedPlatform(String),

    #[error("image {0} is not present locally")]
    ImageMissing(String),

    #[error("image pull exited with code {0}")]
    PullFailed(i32),

    #[error("compose exited with code {0}")]
    ComposeFailed(i32),

    #[error("health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("failed to spawn `{program}`: {reason}")]
    Spawn { program: String, reason: String },
}

impl ReconcileError {
    /// Whether this failure needs a human rather than another retry.
    pub fn needs_user(&self) -> bool {
        matches!(
            self,
            ReconcileError::NotInstalled | ReconcileError::UnsupportedPlatform(_)
        )
    }
}
