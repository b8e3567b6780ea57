//! Host environment abstraction.
//!
//! The gate never touches a browser directly; it talks to a [`Host`], which
//! owns the document, the global dispatch function, and its backing queue.
//! Hosts are external mutable state: the gate re-checks them on every call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tr_common::{Error, Result};
use url::Url;

use super::call::GtagCall;

/// Where an injected element ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountPoint {
    Head,
    Body,
    Root,
}

/// The loader script element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptTag {
    pub id: String,
    pub src: String,
    /// Asynchronous, non-blocking load.
    #[serde(rename = "async")]
    pub is_async: bool,
}

/// The current page address, pre-split the way `window.location` exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    href: String,
    origin: String,
    path_and_query: String,
}

impl Default for PageLocation {
    /// `http://localhost/`
    fn default() -> Self {
        Self {
            href: "http://localhost/".to_string(),
            origin: "http://localhost".to_string(),
            path_and_query: "/".to_string(),
        }
    }
}

impl PageLocation {
    /// Parse an absolute URL.
    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href).map_err(|e| Error::InvalidLocation(format!("{href}: {e}")))?;
        Ok(Self::from_url(&url))
    }

    fn from_url(url: &Url) -> Self {
        Self {
            href: url.as_str().to_string(),
            origin: url.origin().ascii_serialization(),
            path_and_query: path_and_query(url),
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `pathname + search`.
    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Resolve `target` against this page's origin and return its
    /// `pathname + search`. `None` when it does not parse.
    pub fn resolve_path(&self, target: &str) -> Option<String> {
        let base = Url::parse(&self.origin).ok()?;
        let url = base.join(target).ok()?;
        Some(path_and_query(&url))
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", url.path(), q),
        _ => url.path().to_string(),
    }
}

/// A browser-like environment hosting the outbound channel.
pub trait Host {
    /// Whether a global window/document context exists at all.
    fn has_global_context(&self) -> bool;

    /// Whether the global dispatch function is installed.
    fn has_dispatch(&self) -> bool;

    /// Install the dispatch function, forwarding every call into the backing
    /// queue. An existing queue is kept.
    fn install_dispatch(&mut self);

    /// Whether an element with this id is present in the document.
    fn element_exists(&self, id: &str) -> bool;

    /// Append a script to the first available of head, body, root.
    fn append_script(&mut self, script: ScriptTag) -> MountPoint;

    fn location(&self) -> PageLocation;

    fn title(&self) -> String;

    fn now(&self) -> DateTime<Utc>;

    /// Invoke the global dispatch function. Fire-and-forget.
    fn dispatch(&mut self, call: GtagCall);
}
