//! Track Relay core: event normalization pipeline and transport gate.
//!
//! Loosely-typed event names and property bags go in; vendor-compliant
//! dispatch calls come out. The pipeline, leaves first:
//!
//! - [`coerce`] - value → wire scalar
//! - [`flatten`] - nested maps → dotted paths
//! - [`grammar`] - name/key grammars and snake-case conversion
//! - [`rules`] - static alias, rename, drop, and priority tables
//! - [`sanitize`] - parameter and user-property sanitizers
//! - [`gate`] - lazy channel bootstrap and the public operations
//!
//! Nothing in the pipeline returns an error: anything that does not qualify
//! is dropped and logged at `debug`.
//!
//! ```
//! use tr_core::gate::{MemoryHost, TransportGate};
//! use tr_common::PropBag;
//! use tr_config::TrackerConfig;
//!
//! let config = TrackerConfig::default().with_measurement_id("G-XXXX");
//! let mut gate = TransportGate::new(config, MemoryHost::new());
//! gate.track("docCreated", &PropBag::new().with("page", "editor"));
//!
//! let last = gate.host().data_layer().last().unwrap();
//! assert_eq!(last.event_name(), Some("doc_created"));
//! ```

pub mod cli;
pub mod coerce;
pub mod exit_codes;
pub mod flatten;
pub mod gate;
pub mod grammar;
pub mod logging;
pub mod rules;
pub mod sanitize;

pub use gate::{GtagCall, Host, MemoryHost, TransportGate};
pub use sanitize::{sanitize_params, sanitize_user_properties, ParamSet, UserPropertySet};
