//! Exit codes for the tr-core CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.

use tr_common::Error;

/// Exit codes for tr-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Call emitted / output produced
    Clean = 0,

    /// The requested call was dropped (inert gate, invalid name, empty set)
    Dropped = 1,

    /// Configuration error
    ConfigError = 10,

    /// Malformed input (props JSON, arguments)
    InputError = 11,

    /// I/O error
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::Dropped)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.code() {
            10..=19 => ExitCode::ConfigError,
            20..=39 => ExitCode::InputError,
            60 => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}
