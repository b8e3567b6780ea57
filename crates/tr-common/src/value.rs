//! Property value model.
//!
//! Incoming property bags are loosely typed. Instead of probing shapes at
//! every recursion level, each value is classified once, at ingestion, into
//! the closed [`PropValue`] enum. Only [`PropValue::PlainMap`] is ever
//! recursed into by the flattener; everything else is a leaf.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

use crate::scalar::js_number_string;

/// A single property value, classified at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Null or absent.
    Null,
    Bool(bool),
    /// Any number, including non-finite ones.
    Number(f64),
    String(String),
    /// A point in time (date-like input).
    Temporal(DateTime<Utc>),
    Array(Vec<PropValue>),
    /// A plain key/value structure; the only shape that gets flattened.
    PlainMap(PropBag),
    /// A non-plain object. Carries the host's serialization of it, or `None`
    /// when the host could not serialize it (functions, cycles).
    Opaque(Option<String>),
}

impl PropValue {
    /// Short name of the variant, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PropValue::Null => "null",
            PropValue::Bool(_) => "bool",
            PropValue::Number(_) => "number",
            PropValue::String(_) => "string",
            PropValue::Temporal(_) => "temporal",
            PropValue::Array(_) => "array",
            PropValue::PlainMap(_) => "map",
            PropValue::Opaque(_) => "opaque",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Serialize with browser `JSON.stringify` semantics.
    ///
    /// Returns `None` when the value has no JSON form (an unserializable
    /// opaque value at the top level).
    pub fn to_json_string(&self) -> Option<String> {
        match self {
            PropValue::Null => Some("null".to_string()),
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::Number(n) if n.is_finite() => Some(js_number_string(*n)),
            PropValue::Number(_) => Some("null".to_string()),
            PropValue::String(s) => Some(quote(s)),
            PropValue::Temporal(t) => Some(quote(&iso_string(t))),
            PropValue::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| item.to_json_string().unwrap_or_else(|| "null".to_string()))
                    .collect();
                Some(format!("[{}]", parts.join(",")))
            }
            PropValue::PlainMap(bag) => {
                let parts: Vec<String> = bag
                    .iter()
                    .filter_map(|(k, v)| v.to_json_string().map(|json| format!("{}:{}", quote(k), json)))
                    .collect();
                Some(format!("{{{}}}", parts.join(",")))
            }
            PropValue::Opaque(serialized) => serialized.clone(),
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso_string(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        PropValue::Number(n)
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        PropValue::Number(n as f64)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        PropValue::Number(f64::from(n))
    }
}

impl From<u32> for PropValue {
    fn from(n: u32) -> Self {
        PropValue::Number(f64::from(n))
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::String(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::String(s)
    }
}

impl From<DateTime<Utc>> for PropValue {
    fn from(t: DateTime<Utc>) -> Self {
        PropValue::Temporal(t)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(items: Vec<PropValue>) -> Self {
        PropValue::Array(items)
    }
}

impl From<PropBag> for PropValue {
    fn from(bag: PropBag) -> Self {
        PropValue::PlainMap(bag)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(PropValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => PropValue::Null,
            Value::Bool(b) => PropValue::Bool(b),
            Value::Number(n) => PropValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => PropValue::String(s),
            Value::Array(items) => PropValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => PropValue::PlainMap(map.into_iter().collect()),
        }
    }
}

// ── Property bag ────────────────────────────────────────────────────────

/// An insertion-ordered property bag.
///
/// Re-inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropBag {
    entries: Vec<(String, PropValue)>,
}

impl PropBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
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

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for PropBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

impl IntoIterator for PropBag {
    type Item = (String, PropValue);
    type IntoIter = std::vec::IntoIter<(String, PropValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ── Deserialization ─────────────────────────────────────────────────────
//
// Hand-written visitors keep object keys in document order; going through
// `serde_json::Value` would sort them.

struct PropValueVisitor;

impl<'de> Visitor<'de> for PropValueVisitor {
    type Value = PropValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<PropValue, E> {
        Ok(PropValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PropValue, E> {
        Ok(PropValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PropValue, E> {
        Ok(PropValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<PropValue, E> {
        Ok(PropValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PropValue, E> {
        Ok(PropValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<PropValue, E> {
        Ok(PropValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<PropValue, E> {
        Ok(PropValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<PropValue, E> {
        Ok(PropValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<PropValue, D::Error> {
        PropValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PropValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<PropValue>()? {
            items.push(item);
        }
        Ok(PropValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<PropValue, A::Error> {
        PropBagVisitor.visit_map(map).map(PropValue::PlainMap)
    }
}

impl<'de> Deserialize<'de> for PropValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PropValueVisitor)
    }
}

struct PropBagVisitor;

impl<'de> Visitor<'de> for PropBagVisitor {
    type Value = PropBag;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PropBag, A::Error> {
        let mut bag = PropBag::new();
        while let Some((key, value)) = map.next_entry::<String, PropValue>()? {
            bag.insert(key, value);
        }
        Ok(bag)
    }
}

impl<'de> Deserialize<'de> for PropBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropBagVisitor)
    }
}
