//! Transport gate: lazy bootstrap of the outbound channel and the public
//! tracking operations built on top of it.
//!
//! # State
//!
//! The gate owns `{enabled, configured}`:
//! - `enabled` starts true and is toggled by [`TransportGate::set_enabled`].
//! - `configured` starts false and flips to true exactly once, the first
//!   time [`TransportGate::ensure_ready`] succeeds. It is never cleared
//!   except by [`TransportGate::reset_for_tests`].
//!
//! # Readiness
//!
//! Every operation first calls `ensure_ready`, which re-inspects the host
//! each time (dispatch function present? loader script present?) because the
//! document can change between calls. When readiness fails the operation is a
//! silent no-op.

mod call;
mod host;
mod memory;

pub use call::GtagCall;
pub use host::{Host, MountPoint, PageLocation, ScriptTag};
pub use memory::MemoryHost;

use serde::Serialize;
use tracing::{debug, info};
use tr_common::{PropBag, PropValue, Scalar};
use tr_config::TrackerConfig;

use crate::grammar::map_event_name;
use crate::sanitize::{
    sanitize_params, sanitize_user_properties, ParamSet, DEFAULT_MAX_PARAMS, PAGEVIEW_MAX_PARAMS,
};

/// Event name used for page views.
pub const PAGE_VIEW_EVENT: &str = "page_view";

/// Property that overrides the page location in [`TransportGate::pageview`].
pub const LOCATION_PROP: &str = "location";

/// Process-wide readiness flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateState {
    pub enabled: bool,
    pub configured: bool,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            enabled: true,
            configured: false,
        }
    }
}

/// Owns the host and the readiness state; construct once per process.
#[derive(Debug)]
pub struct TransportGate<H: Host> {
    host: H,
    config: TrackerConfig,
    state: GateState,
}

impl<H: Host> TransportGate<H> {
    pub fn new(config: TrackerConfig, host: H) -> Self {
        if config.is_inert() {
            debug!("transport gate created without measurement id");
        }
        Self {
            host,
            config,
            state: GateState::default(),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Restore the initial `{enabled: true, configured: false}` state.
    pub fn reset_for_tests(&mut self) {
        self.state = GateState::default();
    }

    /// Enable or disable all operations. Enabling attempts bootstrap.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
        debug!(enabled, "tracking toggled");
        if enabled {
            self.ensure_ready();
        }
    }

    /// Bootstrap the channel if possible. Returns whether it is usable.
    pub fn ensure_ready(&mut self) -> bool {
        if !self.state.enabled {
            return false;
        }
        let (Some(measurement_id), Some(src)) =
            (self.config.measurement_id().map(str::to_string), self.config.loader_src())
        else {
            return false;
        };
        if !self.host.has_global_context() {
            debug!("no global context, transport unavailable");
            return false;
        }

        if !self.host.has_dispatch() {
            self.host.install_dispatch();
            debug!("dispatch function installed");
        }

        if !self.host.element_exists(&self.config.script_id) {
            let mount = self.host.append_script(ScriptTag {
                id: self.config.script_id.clone(),
                src,
                is_async: true,
            });
            info!(script_id = %self.config.script_id, ?mount, "loader script injected");
        }

        if !self.state.configured {
            self.state.configured = true;
            let now = self.host.now();
            self.host.dispatch(GtagCall::Js(now));
            self.host.dispatch(GtagCall::Config {
                measurement_id,
                send_page_view: false,
            });
            info!("transport configured");
        }

        true
    }

    /// Send a custom event. Invalid names drop the whole call.
    pub fn track(&mut self, event_name: &str, props: &PropBag) {
        if !self.ensure_ready() {
            return;
        }
        let Some(name) = map_event_name(event_name) else {
            debug!(event = event_name, "dropping event with invalid name");
            return;
        };
        let params = sanitize_params(props, DEFAULT_MAX_PARAMS);
        debug!(event = %name, params = params.len(), "event sent");
        self.host.dispatch(GtagCall::Event { name, params });
    }

    /// Send a page view for the current page, or for `props.location`.
    pub fn pageview(&mut self, props: &PropBag) {
        if !self.ensure_ready() {
            return;
        }
        let current = self.host.location();
        let location_override = props.get(LOCATION_PROP).and_then(PropValue::as_str);
        let page_location = location_override.unwrap_or(current.href()).to_string();
        let page_path = current
            .resolve_path(&page_location)
            .unwrap_or_else(|| current.path_and_query().to_string());

        let mut extras = props.clone();
        extras.remove(LOCATION_PROP);

        let mut params = ParamSet::new();
        params.insert("page_location", page_location);
        params.insert("page_path", page_path);
        params.insert("page_title", Scalar::Str(self.host.title()));
        params.extend(sanitize_params(&extras, PAGEVIEW_MAX_PARAMS));

        debug!(params = params.len(), "page view sent");
        self.host.dispatch(GtagCall::Event {
            name: PAGE_VIEW_EVENT.to_string(),
            params,
        });
    }

    /// Set or clear the user id. Empty ids clear it.
    pub fn set_user_id(&mut self, user_id: Option<&str>) {
        if !self.ensure_ready() {
            return;
        }
        let id = user_id.filter(|id| !id.is_empty()).map(str::to_string);
        self.host.dispatch(GtagCall::SetUserId(id));
    }

    /// Set user properties; nothing is sent if none survive sanitization.
    pub fn set_user_properties(&mut self, props: &PropBag) {
        if !self.ensure_ready() {
            return;
        }
        let sanitized = sanitize_user_properties(props);
        if sanitized.is_empty() {
            debug!(input = props.len(), "no user properties survived sanitization");
            return;
        }
        self.host.dispatch(GtagCall::SetUserProperties(sanitized));
    }

    /// Clear the user id and user properties on the sink.
    pub fn reset(&mut self) {
        if !self.ensure_ready() {
            return;
        }
        self.host.dispatch(GtagCall::SetUserId(None));
        self.host
            .dispatch(GtagCall::SetUserProperties(Default::default()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> TransportGate<MemoryHost> {
        TransportGate::new(TrackerConfig::default().with_measurement_id("G-TEST"), MemoryHost::new())
    }

    #[test]
    fn bootstrap_sends_js_then_config_once() {
        let mut gate = gate();
        assert!(gate.ensure_ready());
        assert!(gate.ensure_ready());
        let commands: Vec<&str> = gate.host().data_layer().iter().map(GtagCall::command).collect();
        assert_eq!(commands, vec!["js", "config"]);
        assert!(gate.state().configured);
    }

    #[test]
    fn inert_without_measurement_id() {
        let mut gate = TransportGate::new(TrackerConfig::default(), MemoryHost::new());
        gate.track("anything", &PropBag::new());
        assert!(!gate.ensure_ready());
        assert!(gate.host().scripts().is_empty());
        assert!(!gate.host().has_dispatch());
    }

    #[test]
    fn headless_host_is_noop() {
        let mut gate = TransportGate::new(
            TrackerConfig::default().with_measurement_id("G-TEST"),
            MemoryHost::headless(),
        );
        gate.track("x", &PropBag::new());
        assert!(!gate.state().configured);
        assert!(gate.host().data_layer().is_empty());
    }

    #[test]
    fn disabled_gate_does_nothing_until_reenabled() {
        let mut gate = gate();
        gate.set_enabled(false);
        gate.track("x", &PropBag::new());
        assert!(gate.host().data_layer().is_empty());

        gate.set_enabled(true);
        assert!(gate.state().configured);
        assert_eq!(gate.host().data_layer().len(), 2);
    }

    #[test]
    fn invalid_event_name_dropped_silently() {
        let mut gate = gate();
        gate.track("1bad", &PropBag::new().with("a", 1));
        let events = gate.host().data_layer().iter().filter(|c| c.command() == "event").count();
        assert_eq!(events, 0);
    }

    #[test]
    fn empty_user_id_clears() {
        let mut gate = gate();
        gate.set_user_id(Some(""));
        assert_eq!(gate.host().data_layer().last(), Some(&GtagCall::SetUserId(None)));
    }

    #[test]
    fn reset_for_tests_allows_second_bootstrap() {
        let mut gate = gate();
        gate.ensure_ready();
        gate.reset_for_tests();
        assert!(!gate.state().configured);
        gate.ensure_ready();
        let js = gate.host().data_layer().iter().filter(|c| c.command() == "js").count();
        assert_eq!(js, 2);
    }
}
