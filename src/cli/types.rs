use super::args::{LaunchModeOpt, Overrides};
use crate::config::Config;
use crate::engine::LaunchMode;

impl From<LaunchModeOpt> for LaunchMode {
    fn from(m: LaunchModeOpt) -> Self {
        match m {
            LaunchModeOpt::Restart => LaunchMode::Restart,
            LaunchModeOpt::Attach => LaunchMode::Attach,
        }
    }
}

impl Overrides {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.compose_file {
            config.engine.compose_file = path.clone();
        }
        if let Some(image) = &self.image {
            config.engine.image = image.clone();
        }
        if let Some(url) = &self.health_url {
            config.health.url = url.clone();
        }
        if let Some(mode) = self.healthy_mode {
            config.launch.healthy_mode = mode.into();
        }
        if self.no_browser {
            config.ui.open_browser = false;
        }
    }
}
