//! Resolved-configuration snapshot for `config show` and diagnostics.

use serde::Serialize;
use std::path::PathBuf;
use tr_common::SCHEMA_VERSION;

use crate::resolve::ConfigSource;
use crate::settings::TrackerConfig;

/// What the process resolved at start-up.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub schema_version: String,
    pub source: ConfigSource,
    pub measurement_id_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader_src: Option<String>,
    pub script_id: String,
    /// Config file consulted during resolution (whether or not it existed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

impl ConfigSnapshot {
    pub fn capture(config: &TrackerConfig, source: ConfigSource, config_file: Option<PathBuf>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            source,
            measurement_id_present: !config.is_inert(),
            measurement_id: config.measurement_id().map(str::to_string),
            loader_src: config.loader_src(),
            script_id: config.script_id.clone(),
            config_file,
        }
    }
}
