//! In-process host with a simulated document and backing queue.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::call::GtagCall;
use super::host::{Host, MountPoint, PageLocation, ScriptTag};

/// A [`Host`] that records everything in memory.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    global_context: bool,
    has_head: bool,
    has_body: bool,
    dispatch_installed: bool,
    data_layer: Option<Vec<GtagCall>>,
    elements: Vec<(MountPoint, ScriptTag)>,
    location: PageLocation,
    title: String,
    clock: Option<DateTime<Utc>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A browser-like host with head and body, at `http://localhost/`.
    pub fn new() -> Self {
        Self {
            global_context: true,
            has_head: true,
            has_body: true,
            dispatch_installed: false,
            data_layer: None,
            elements: Vec::new(),
            location: PageLocation::default(),
            title: String::new(),
            clock: None,
        }
    }

    /// A host with no window/document at all (server-side, workers).
    pub fn headless() -> Self {
        Self {
            global_context: false,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn without_head(mut self) -> Self {
        self.has_head = false;
        self
    }

    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.has_body = false;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: PageLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Freeze the clock, so `js` timestamps are reproducible.
    #[must_use]
    pub fn with_fixed_clock(mut self, at: DateTime<Utc>) -> Self {
        self.clock = Some(at);
        self
    }

    /// Pre-existing backing queue (e.g. populated before the loader ran).
    #[must_use]
    pub fn with_existing_queue(mut self, calls: Vec<GtagCall>) -> Self {
        self.data_layer = Some(calls);
        self
    }

    /// Every call the dispatch function has received, oldest first.
    pub fn data_layer(&self) -> &[GtagCall] {
        self.data_layer.as_deref().unwrap_or(&[])
    }

    /// Drain the backing queue.
    pub fn take_calls(&mut self) -> Vec<GtagCall> {
        self.data_layer.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Injected script elements with their mount points.
    pub fn scripts(&self) -> &[(MountPoint, ScriptTag)] {
        &self.elements
    }

    /// Remove an element, as page code or a navigation might.
    pub fn remove_element(&mut self, id: &str) -> bool {
        let before = self.elements.len();
        self.elements.retain(|(_, tag)| tag.id != id);
        self.elements.len() != before
    }

    pub fn set_location(&mut self, location: PageLocation) {
        self.location = location;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Host for MemoryHost {
    fn has_global_context(&self) -> bool {
        self.global_context
    }

    fn has_dispatch(&self) -> bool {
        self.dispatch_installed
    }

    fn install_dispatch(&mut self) {
        self.data_layer.get_or_insert_with(Vec::new);
        self.dispatch_installed = true;
    }

    fn element_exists(&self, id: &str) -> bool {
        self.elements.iter().any(|(_, tag)| tag.id == id)
    }

    fn append_script(&mut self, script: ScriptTag) -> MountPoint {
        let mount = if self.has_head {
            MountPoint::Head
        } else if self.has_body {
            MountPoint::Body
        } else {
            MountPoint::Root
        };
        self.elements.push((mount, script));
        mount
    }

    fn location(&self) -> PageLocation {
        self.location.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    fn dispatch(&mut self, call: GtagCall) {
        if !self.dispatch_installed {
            warn!(command = call.command(), "dispatch function not installed, call lost");
            return;
        }
        self.data_layer.get_or_insert_with(Vec::new).push(call);
    }
}
