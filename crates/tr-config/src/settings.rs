//! Tracker configuration type.
//!
//! Matches the `config.json` layout:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "measurement_id": "G-XXXXXXX",
//!   "loader_url": "https://www.googletagmanager.com/gtag/js?id={id}",
//!   "script_id": "ga4-gtag"
//! }
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tr_common::schema::is_compatible;
use tr_common::{Error, Result};

/// Loader URL template; `{id}` is replaced by the encoded measurement id.
pub const DEFAULT_LOADER_URL: &str = "https://www.googletagmanager.com/gtag/js?id={id}";

/// Fixed identifier of the injected loader script element.
pub const DEFAULT_SCRIPT_ID: &str = "ga4-gtag";

const ID_PLACEHOLDER: &str = "{id}";

/// Characters `encodeURIComponent` leaves alone: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Outbound channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Config file format version; files from another major version are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,

    /// Vendor measurement identifier. Absent means the pipeline is inert.
    #[serde(default)]
    pub measurement_id: Option<String>,

    #[serde(default = "default_loader_url")]
    pub loader_url: String,

    #[serde(default = "default_script_id")]
    pub script_id: String,
}

fn default_loader_url() -> String {
    DEFAULT_LOADER_URL.to_string()
}

fn default_script_id() -> String {
    DEFAULT_SCRIPT_ID.to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            schema_version: None,
            measurement_id: None,
            loader_url: default_loader_url(),
            script_id: default_script_id(),
        }
    }
}

impl TrackerConfig {
    /// Config with the default loader and script id.
    pub fn new(measurement_id: Option<String>) -> Self {
        Self {
            measurement_id,
            ..Self::default()
        }
    }

    /// Builder-style measurement id override.
    #[must_use]
    pub fn with_measurement_id(mut self, id: impl Into<String>) -> Self {
        self.measurement_id = Some(id.into());
        self
    }

    /// The measurement id, if present and non-blank.
    pub fn measurement_id(&self) -> Option<&str> {
        self.measurement_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// True when no measurement id is configured.
    pub fn is_inert(&self) -> bool {
        self.measurement_id().is_none()
    }

    /// The loader script `src`, with the measurement id URI-component encoded.
    pub fn loader_src(&self) -> Option<String> {
        let id = self.measurement_id()?;
        let encoded = utf8_percent_encode(id, URI_COMPONENT).to_string();
        Some(self.loader_url.replace(ID_PLACEHOLDER, &encoded))
    }

    /// Check the schema version, loader template and script id.
    pub fn validate(&self) -> Result<()> {
        if let Some(version) = &self.schema_version {
            if !is_compatible(version) {
                return Err(Error::Config(format!(
                    "unsupported config schema_version {version}"
                )));
            }
        }

        if !self.loader_url.contains(ID_PLACEHOLDER) {
            return Err(Error::InvalidLoaderUrl(format!(
                "template must contain {ID_PLACEHOLDER}: {}",
                self.loader_url
            )));
        }
        let probe = self.loader_url.replace(ID_PLACEHOLDER, "probe");
        url::Url::parse(&probe)
            .map_err(|e| Error::InvalidLoaderUrl(format!("{}: {e}", self.loader_url)))?;

        if self.script_id.is_empty() || self.script_id.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "script_id must be a non-empty token, got {:?}",
                self.script_id
            )));
        }

        if let Some(id) = &self.measurement_id {
            if id.chars().any(char::is_control) {
                return Err(Error::InvalidMeasurementId(id.escape_debug().to_string()));
            }
        }
        Ok(())
    }

    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file with full error reporting.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
