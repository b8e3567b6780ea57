//! Track Relay configuration loading and validation.
//!
//! This crate provides:
//! - The typed `TrackerConfig` (measurement id, loader URL, script id)
//! - Config resolution (CLI → env → config file → defaults)
//! - Validation of the schema version, loader URL template and script id
//! - Config snapshots for `config show` and diagnostics

pub mod resolve;
pub mod settings;
pub mod snapshot;

pub use resolve::{
    resolve_config, resolve_config_with_env, ConfigPaths, ConfigSource, MEASUREMENT_ID_ENV,
};
pub use settings::{TrackerConfig, DEFAULT_LOADER_URL, DEFAULT_SCRIPT_ID};
pub use snapshot::ConfigSnapshot;
