//! Event parameter sanitizer.
//!
//! Pipeline per flattened entry: segment drop → key mapping → mapped-key
//! drop → value normalization. Survivors are stably partitioned (priority
//! keys first) and then taken until the cap, first occurrence of a key wins.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;
use tr_common::{PropBag, PropValue, Scalar};

use crate::coerce::coerce;
use crate::flatten::flatten;
use crate::grammar::map_param_key;
use crate::rules::{rules, ENABLED_KEY, RESULT_KEY};

/// Default cap for `track` events.
pub const DEFAULT_MAX_PARAMS: usize = 25;

/// Cap for extra page-view params (three page fields are always added).
pub const PAGEVIEW_MAX_PARAMS: usize = 22;

/// Insertion-ordered sanitized parameters with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: Vec<(String, Scalar)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Overlay `other` onto `self`; existing keys keep their position.
    pub fn extend(&mut self, other: ParamSet) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for ParamSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Sanitize a property bag into at most `max_params` wire parameters.
pub fn sanitize_params(props: &PropBag, max_params: usize) -> ParamSet {
    let rules = rules();
    let mut mapped: Vec<(String, Scalar)> = Vec::new();

    for (path, value) in flatten(props).iter() {
        if rules.is_dropped_path(path) {
            debug!(path, "dropping parameter with excluded segment");
            continue;
        }
        let Some(key) = map_param_key(path) else {
            debug!(path, "dropping parameter with invalid key");
            continue;
        };
        if rules.is_dropped_mapped_key(&key) {
            debug!(%key, "dropping excluded parameter");
            continue;
        }
        let Some(scalar) = normalize_value(&key, value) else {
            debug!(%key, kind = value.kind(), "dropping parameter with uncoercible value");
            continue;
        };
        mapped.push((key, scalar));
    }

    // Stable: relative order inside each partition is preserved.
    mapped.sort_by_key(|(key, _)| !rules.is_priority_key(key));

    let mut out = ParamSet::new();
    for (key, value) in mapped {
        if out.len() >= max_params {
            break;
        }
        if out.contains_key(&key) {
            continue;
        }
        out.entries.push((key, value));
    }
    out
}

fn normalize_value(key: &str, value: &PropValue) -> Option<Scalar> {
    match (key, value) {
        (RESULT_KEY, PropValue::Bool(b)) => Some(Scalar::from(if *b { "success" } else { "failure" })),
        (ENABLED_KEY, PropValue::Bool(b)) => Some(Scalar::from(if *b { "on" } else { "off" })),
        _ => coerce(value),
    }
}
