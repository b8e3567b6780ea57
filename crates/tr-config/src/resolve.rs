//! Configuration resolution.
//!
//! The measurement id is looked up once, at process start, in this order:
//! explicit CLI value → `TR_MEASUREMENT_ID` → config file → absent.
//! A missing config file is not an error; a malformed one is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tr_common::Result;

use crate::settings::TrackerConfig;
use crate::snapshot::ConfigSnapshot;

/// Environment variable carrying the measurement id.
pub const MEASUREMENT_ID_ENV: &str = "TR_MEASUREMENT_ID";

const CONFIG_DIR_NAME: &str = "track-relay";
const CONFIG_FILE_NAME: &str = "config.json";

/// Where the measurement id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Cli,
    Env,
    File,
    None,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Cli => write!(f, "cli"),
            ConfigSource::Env => write!(f, "env"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::None => write!(f, "none"),
        }
    }
}

/// Config file location.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file (`--config`). Falls back to the XDG location.
    pub config_file: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn new(config_file: Option<PathBuf>) -> Self {
        Self { config_file }
    }

    /// The file that will be consulted, if any.
    pub fn effective_file(&self) -> Option<PathBuf> {
        self.config_file.clone().or_else(default_config_file)
    }
}

fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolve configuration from the process environment.
pub fn resolve_config(
    cli_measurement_id: Option<&str>,
    paths: &ConfigPaths,
) -> Result<(TrackerConfig, ConfigSnapshot)> {
    resolve_config_with_env(cli_measurement_id, paths, |key| std::env::var(key).ok())
}

/// Resolve configuration with an injectable environment lookup.
pub fn resolve_config_with_env(
    cli_measurement_id: Option<&str>,
    paths: &ConfigPaths,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(TrackerConfig, ConfigSnapshot)> {
    let file_path = paths.effective_file();
    let mut config = match file_path.as_deref() {
        Some(path) => load_optional(path)?,
        None => None,
    }
    .unwrap_or_default();
    let file_has_id = config.measurement_id().is_some();

    let source = if let Some(id) = non_blank(cli_measurement_id) {
        config.measurement_id = Some(id.to_string());
        ConfigSource::Cli
    } else if let Some(id) = env(MEASUREMENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
        config.measurement_id = Some(id);
        ConfigSource::Env
    } else if file_has_id {
        ConfigSource::File
    } else {
        config.measurement_id = None;
        ConfigSource::None
    };

    config.validate()?;
    if source == ConfigSource::None {
        warn!("no measurement id configured; tracking is inert");
    } else {
        debug!(%source, "measurement id resolved");
    }

    let snapshot = ConfigSnapshot::capture(&config, source, file_path);
    Ok((config, snapshot))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn load_optional(path: &Path) -> Result<Option<TrackerConfig>> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(None);
    }
    TrackerConfig::load_from_file(path).map(Some)
}
