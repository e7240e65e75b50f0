//! Configuration file lookup and defaults.
//!
//! Every field has a default, so running without any config file is the
//! normal case. A file only needs the keys it overrides:
//!
//! ```toml
//! [engine]
//! image = "omnitool/omnitool:latest"
//! compose_file = "/opt/omnitool/docker-compose.yml"
//!
//! [monitor]
//! steady_secs = 30
//! retry_secs = 10
//! ```

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::engine::LaunchMode;

pub const CONFIG_FILE: &str = "omniwatch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub health: HealthConfig,
    pub monitor: MonitorConfig,
    pub install: InstallConfig,
    pub launch: LaunchConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine CLI used for the version, info, images and pull probes.
    pub binary: String,
    /// Compose invocation prefix, split with shell rules ("docker compose",
    /// "docker-compose", "podman compose").
    pub compose_command: String,
    pub compose_file: PathBuf,
    pub image: String,
    /// stderr fragments of `info` meaning "daemon not running" rather than
    /// a broken install.
    pub unreachable_markers: Vec<String>,
    pub start_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            compose_command: "docker compose".to_string(),
            compose_file: PathBuf::from("docker-compose.yml"),
            image: "omnitool/omnitool:latest".to_string(),
            unreachable_markers: vec![
                "Cannot connect to the Docker daemon".to_string(),
                "Is the docker daemon running".to_string(),
                "error during connect".to_string(),
            ],
            start_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:1688".to_string(),
            timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub steady_secs: u64,
    pub retry_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            steady_secs: 30,
            retry_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InstallConfig {
    pub poll_secs: u64,
    pub timeout_secs: u64,
    pub download_url: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            poll_secs: 10,
            timeout_secs: 3600,
            download_url: "https://www.docker.com/products/docker-desktop/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LaunchConfig {
    /// Case-sensitive substrings that mark the app as likely ready.
    pub readiness_markers: Vec<String>,
    /// Mode used when the app is already healthy.
    pub healthy_mode: LaunchMode,
    /// How long `launch` waits for an exit or a marker before returning
    /// and leaving the compose process running.
    pub grace_secs: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            readiness_markers: vec!["Server ready".to_string(), "Attaching to".to_string()],
            healthy_mode: LaunchMode::Restart,
            grace_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub open_browser: bool,
    /// Compose service prefix removed from forwarded output lines.
    pub strip_prefix: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            open_browser: true,
            strip_prefix: "omnitool-1  | ".to_string(),
        }
    }
}

impl Config {
    pub fn steady_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.steady_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.retry_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health.timeout_ms)
    }

    /// Split `engine.compose_command` into program and leading arguments.
    pub fn compose_argv(&self) -> Result<(String, Vec<String>)> {
        let mut words = shell_words::split(&self.engine.compose_command)
            .with_context(|| format!("parsing compose_command: {}", self.engine.compose_command))?;
        if words.is_empty() {
            bail!("compose_command is empty");
        }
        let program = words.remove(0);
        Ok((program, words))
    }

    pub fn validate(&self) -> Result<()> {
        if self.monitor.steady_secs == 0 || self.monitor.retry_secs == 0 {
            bail!("monitor intervals must be at least one second");
        }
        if self.install.poll_secs == 0 {
            bail!("install.poll_secs must be at least one second");
        }
        if self.engine.image.trim().is_empty() {
            bail!("engine.image is empty");
        }
        // The probe client is built without TLS
        if !self.health.url.starts_with("http://") {
            bail!("health.url must be a plain http:// URL: {}", self.health.url);
        }
        if self.launch.healthy_mode == LaunchMode::Up {
            bail!("launch.healthy_mode must be \"restart\" or \"attach\", not \"up\"");
        }
        self.compose_argv()?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }
}

/// Locate the config file.
///
/// Order: explicit path (must exist), XDG config dir, /etc/omniwatch.
/// Returns None when nothing is found; defaults apply.
pub fn find_config_file(explicit_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "omniwatch") {
        let p = proj_dirs.config_dir().join(CONFIG_FILE);
        if p.exists() {
            return Ok(Some(p));
        }
    }

    let system = Path::new("/etc/omniwatch").join(CONFIG_FILE);
    if system.exists() {
        return Ok(Some(system));
    }

    Ok(None)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("parsing config")?;
    config.validate()?;
    Ok(config)
}

/// Load the config, falling back to defaults when no file is found.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config> {
    let Some(path) = find_config_file(explicit_path)? else {
        info!(target: "config", "no config file found, using defaults");
        return Ok(Config::default());
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config file: {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("loading config file: {}", path.display()))?;

    info!(target: "config", config_file = %path.display(), "loaded config");
    Ok(config)
}
