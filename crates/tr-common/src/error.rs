//! Error types for Track Relay.
//!
//! The sanitizing pipeline itself never fails; these errors cover the
//! surfaces around it (configuration, host setup, CLI input, output).

use thiserror::Error;

/// Result type alias for Track Relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Track Relay.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid measurement id: {0}")]
    InvalidMeasurementId(String),

    #[error("invalid loader url template: {0}")]
    InvalidLoaderUrl(String),

    // Host environment errors (20-29)
    #[error("host environment unavailable")]
    HostUnavailable,

    #[error("invalid page location: {0}")]
    InvalidLocation(String),

    // Input errors (30-39)
    #[error("properties must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidMeasurementId(_) => 11,
            Error::InvalidLoaderUrl(_) => 12,
            Error::HostUnavailable => 20,
            Error::InvalidLocation(_) => 21,
            Error::NotAnObject(_) => 30,
            Error::InvalidInput(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Whether this error originates from configuration.
    pub fn is_config(&self) -> bool {
        (10..20).contains(&self.code())
    }
}
