//! Outbound dispatch calls.
//!
//! Each variant serializes to the exact argument array the global dispatch
//! function receives, e.g. `["event","page_view",{...}]`. An absent user id
//! serializes as `null` (the dispatch surface receives `undefined`).

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use tr_common::value::iso_string;

use crate::sanitize::{ParamSet, UserPropertySet};

/// One call into the vendor dispatch function.
#[derive(Debug, Clone, PartialEq)]
pub enum GtagCall {
    /// `("js", <timestamp>)`: clock sync, sent once per process.
    Js(DateTime<Utc>),
    /// `("config", <id>, {send_page_view})`: sent once per process.
    Config {
        measurement_id: String,
        send_page_view: bool,
    },
    /// `("event", <name>, <params>)`.
    Event { name: String, params: ParamSet },
    /// `("set", "user_id", <id | undefined>)`.
    SetUserId(Option<String>),
    /// `("set", "user_properties", <props>)`.
    SetUserProperties(UserPropertySet),
}

impl GtagCall {
    /// The first argument: `js`, `config`, `event`, or `set`.
    pub fn command(&self) -> &'static str {
        match self {
            GtagCall::Js(_) => "js",
            GtagCall::Config { .. } => "config",
            GtagCall::Event { .. } => "event",
            GtagCall::SetUserId(_) | GtagCall::SetUserProperties(_) => "set",
        }
    }

    /// Event name, for `event` calls.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            GtagCall::Event { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Event params, for `event` calls.
    pub fn params(&self) -> Option<&ParamSet> {
        match self {
            GtagCall::Event { params, .. } => Some(params),
            _ => None,
        }
    }
}

struct ConfigOptions {
    send_page_view: bool,
}

impl Serialize for ConfigOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("send_page_view", &self.send_page_view)?;
        map.end()
    }
}

impl Serialize for GtagCall {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GtagCall::Js(at) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("js")?;
                seq.serialize_element(&iso_string(at))?;
                seq.end()
            }
            GtagCall::Config {
                measurement_id,
                send_page_view,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("config")?;
                seq.serialize_element(measurement_id)?;
                seq.serialize_element(&ConfigOptions {
                    send_page_view: *send_page_view,
                })?;
                seq.end()
            }
            GtagCall::Event { name, params } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("event")?;
                seq.serialize_element(name)?;
                seq.serialize_element(params)?;
                seq.end()
            }
            GtagCall::SetUserId(id) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("set")?;
                seq.serialize_element("user_id")?;
                seq.serialize_element(id)?;
                seq.end()
            }
            GtagCall::SetUserProperties(props) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("set")?;
                seq.serialize_element("user_properties")?;
                seq.serialize_element(props)?;
                seq.end()
            }
        }
    }
}
