//! Track Relay common types and errors.
//!
//! This crate provides foundational types shared across the tr-* crates:
//! - The closed property value model decided once at ingestion
//! - The outbound scalar type carried by sanitized sets
//! - Common error types
//! - Output format selection for the CLI
//! - Schema versioning for JSON outputs

pub mod error;
pub mod output;
pub mod scalar;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
pub use output::OutputFormat;
pub use scalar::Scalar;
pub use schema::SCHEMA_VERSION;
pub use value::{PropBag, PropValue};
