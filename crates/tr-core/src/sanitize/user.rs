//! User-property sanitizer.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;
use tr_common::{PropBag, PropValue};

use crate::coerce::{coerce, truncate_chars};
use crate::grammar::map_user_prop_key;
use crate::rules::{PLAN_TIER_KEY, PLAN_TIER_TOKENS};

/// Maximum characters in a user-property value.
pub const MAX_USER_PROP_VALUE_LEN: usize = 36;

/// Sanitized user properties: snake_case keys to short strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPropertySet {
    entries: Vec<(String, String)>,
}

impl UserPropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for UserPropertySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Sanitize persistent user-level properties. No ordering or count cap.
pub fn sanitize_user_properties(props: &PropBag) -> UserPropertySet {
    let mut out = UserPropertySet::new();
    for (raw_key, value) in props.iter() {
        let Some(key) = map_user_prop_key(raw_key) else {
            debug!(key = raw_key, "dropping user property with invalid or reserved key");
            continue;
        };

        let remapped;
        let value = match value {
            PropValue::Bool(b) if raw_key == PLAN_TIER_KEY => {
                let (on, off) = PLAN_TIER_TOKENS;
                remapped = PropValue::from(if *b { on } else { off });
                &remapped
            }
            other => other,
        };

        let Some(scalar) = coerce(value) else {
            debug!(%key, "dropping user property with uncoercible value");
            continue;
        };
        out.insert(key, truncate_chars(&scalar.to_string(), MAX_USER_PROP_VALUE_LEN));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pro_flag_becomes_plan_tier() {
        let pro = sanitize_user_properties(&PropBag::new().with("pro", true));
        assert_eq!(pro.get("plan_tier"), Some("pro"));

        let free = sanitize_user_properties(&PropBag::new().with("pro", false));
        assert_eq!(free.get("plan_tier"), Some("free"));
    }

    #[test]
    fn other_booleans_stringify_as_numbers() {
        let out = sanitize_user_properties(&PropBag::new().with("isDesktop", true).with("ai", false));
        assert_eq!(out.get("is_desktop"), Some("1"));
        assert_eq!(out.get("ai_enabled"), Some("0"));
    }

    #[test]
    fn reserved_prefix_always_excluded() {
        let out = sanitize_user_properties(&PropBag::new().with("$email", "a@b.c").with("$pro", true));
        assert!(out.is_empty());
    }

    #[test]
    fn values_truncated_to_36() {
        let out = sanitize_user_properties(&PropBag::new().with("appVersion", "v".repeat(50)));
        assert_eq!(out.get("app_version").map(str::len), Some(36));
    }

    #[test]
    fn numbers_use_plain_rendering() {
        let out = sanitize_user_properties(&PropBag::new().with("quota", 10).with("ratio", 0.5));
        assert_eq!(out.get("quota_tier"), Some("10"));
        assert_eq!(out.get("ratio"), Some("0.5"));
    }

    #[test]
    fn long_keys_and_nulls_dropped() {
        let out = sanitize_user_properties(
            &PropBag::new()
                .with("aVeryLongUserPropertyNameHere", "x")
                .with("environment", PropValue::Null)
                .with("distribution", "stable"),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("distribution"), Some("stable"));
    }

    #[test]
    fn nested_values_serialize() {
        let out = sanitize_user_properties(
            &PropBag::new().with("meta", PropBag::new().with("a", 1)),
        );
        assert_eq!(out.get("meta"), Some(r#"{"a":1}"#));
    }

    #[test]
    fn serializes_as_object() {
        let out = sanitize_user_properties(&PropBag::new().with("pro", true).with("environment", "prod"));
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"plan_tier":"pro","environment":"prod"}"#
        );
    }
}
