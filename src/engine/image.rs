use tracing::{info, warn};

use super::Engine;
use crate::error::ReconcileError;
use crate::state::{Dimension, Status, StatusBoard};

impl Engine {
    /// Is the configured image in the local cache? Any query failure counts
    /// as absent; the pull that follows will surface the real problem.
    pub async fn check_image_present(&self, board: &mut StatusBoard) -> bool {
        board.begin_check(Dimension::ImagePresent);

        let present = match self.capture(&self.binary, &["images", "-q", self.image.as_str()]).await {
            Ok(out) if out.success() => !out.stdout.trim().is_empty(),
            Ok(out) => {
                warn!(target: "engine", image = %self.image, code = out.code, stderr = %out.stderr.trim(), "image query failed");
                false
            }
            Err(e) => {
                warn!(target: "engine", image = %self.image, error = %e, "image query failed");
                false
            }
        };

        if !present {
            info!(target: "engine", image = %self.image, "image not present locally");
        }
        board.set(
            Dimension::ImagePresent,
            if present { Status::Ok } else { Status::Missing },
        );
        present
    }

    /// Pull (or update) the configured image, streaming progress.
    pub async fn pull_or_update(&self, board: &mut StatusBoard) -> Result<(), ReconcileError> {
        info!(target: "engine", image = %self.image, "pulling image");
        board.set(Dimension::ImagePresent, Status::Pending);

        let code = match self.stream(&self.binary, &["pull", self.image.as_str()]).await {
            Ok(code) => code,
            Err(e) => {
                board.set(Dimension::ImagePresent, Status::Error);
                return Err(e);
            }
        };

        if code != 0 {
            warn!(target: "engine", image = %self.image, code, "image pull failed");
            board.set(Dimension::ImagePresent, Status::Error);
            return Err(ReconcileError::PullFailed(code));
        }

        info!(target: "engine", image = %self.image, "image pulled");
        board.set(Dimension::ImagePresent, Status::Ok);
        Ok(())
    }
}
