//! Event-name, parameter-key, and user-property-key grammar.
//!
//! Every mapper returns `None` when its input does not qualify; callers drop
//! the event or key silently.

use regex::Regex;
use std::sync::LazyLock;

use crate::rules::{rules, RESERVED_USER_PROP_PREFIX};

static EVENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,39}$").expect("event name regex"));
static PARAM_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,39}$").expect("param name regex"));
static USER_PROP_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,23}$").expect("user prop regex"));

static LOWER_UPPER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("snake regex"));
static ACRONYM_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z0-9]+)").expect("snake regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("snake regex"));
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("snake regex"));
static REPEATED_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__+").expect("snake regex"));

/// Convert an arbitrary identifier to snake_case.
///
/// Applied in this exact order: `aB` → `a_B`, `HTMLParser` → `HTML_Parser`,
/// whitespace runs → `_`, other non-word characters → `_`, `_` runs → `_`,
/// then lowercase.
pub fn to_snake_case(input: &str) -> String {
    let s = LOWER_UPPER_RE.replace_all(input, "${1}_${2}");
    let s = ACRONYM_WORD_RE.replace_all(&s, "${1}_${2}");
    let s = WHITESPACE_RE.replace_all(&s, "_");
    let s = NON_WORD_RE.replace_all(&s, "_");
    let s = REPEATED_UNDERSCORE_RE.replace_all(&s, "_");
    s.to_lowercase()
}

pub fn is_valid_event_name(name: &str) -> bool {
    EVENT_NAME_RE.is_match(name)
}

pub fn is_valid_param_key(key: &str) -> bool {
    PARAM_NAME_RE.is_match(key)
}

pub fn is_valid_user_prop_key(key: &str) -> bool {
    USER_PROP_NAME_RE.is_match(key)
}

/// Alias, snake-case, and validate an event name.
pub fn map_event_name(name: &str) -> Option<String> {
    let aliased = rules().event_alias(name).unwrap_or(name);
    let mapped = to_snake_case(aliased);
    is_valid_event_name(&mapped).then_some(mapped)
}

/// Rename each segment of a dotted path, join with `_`, snake-case, validate.
pub fn map_param_key(path: &str) -> Option<String> {
    let joined = path
        .split('.')
        .map(|segment| rules().param_rename(segment).unwrap_or(segment))
        .collect::<Vec<_>>()
        .join("_");
    let mapped = to_snake_case(&joined);
    is_valid_param_key(&mapped).then_some(mapped)
}

/// Map a user-property key; reserved-prefix keys never qualify.
pub fn map_user_prop_key(key: &str) -> Option<String> {
    if key.starts_with(RESERVED_USER_PROP_PREFIX) {
        return None;
    }
    let renamed = rules().user_prop_rename(key).unwrap_or(key);
    let mapped = to_snake_case(renamed);
    is_valid_user_prop_key(&mapped).then_some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_camel() {
        assert_eq!(to_snake_case("docId"), "doc_id");
        assert_eq!(to_snake_case("withAttachment"), "with_attachment");
        assert_eq!(to_snake_case("a1B2C"), "a1_b2_c");
    }

    #[test]
    fn snake_case_acronyms() {
        assert_eq!(to_snake_case("HTMLParser"), "html_parser");
        assert_eq!(to_snake_case("openAIChat"), "open_ai_chat");
        assert_eq!(to_snake_case("ABC"), "abc");
    }

    #[test]
    fn snake_case_separators() {
        assert_eq!(to_snake_case("hello  world"), "hello_world");
        assert_eq!(to_snake_case("a-b.c/d"), "a_b_c_d");
        assert_eq!(to_snake_case("a__b___c"), "a_b_c");
        assert_eq!(to_snake_case("émoji 🎉 key"), "_moji_key");
    }

    #[test]
    fn snake_case_keeps_edges() {
        assert_eq!(to_snake_case("_leading"), "_leading");
        assert_eq!(to_snake_case("trailing-"), "trailing_");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn event_name_alias_and_case() {
        assert_eq!(map_event_name("track_pageview").as_deref(), Some("page_view"));
        assert_eq!(map_event_name("docCreated").as_deref(), Some("doc_created"));
        assert_eq!(map_event_name("Open Settings").as_deref(), Some("open_settings"));
    }

    #[test]
    fn event_name_rejections() {
        assert_eq!(map_event_name(""), None);
        assert_eq!(map_event_name("1st_event"), None);
        assert_eq!(map_event_name("_private"), None);
        assert_eq!(map_event_name(&"a".repeat(41)), None);
        assert!(map_event_name(&"a".repeat(40)).is_some());
    }

    #[test]
    fn param_key_segments_renamed_individually() {
        assert_eq!(map_param_key("page").as_deref(), Some("ui_page"));
        assert_eq!(map_param_key("doc.docType").as_deref(), Some("doc_doc_type"));
        assert_eq!(map_param_key("settings.key").as_deref(), Some("settings_setting_key"));
        assert_eq!(map_param_key("status").as_deref(), Some("result"));
    }

    #[test]
    fn param_key_invalid_after_mapping() {
        assert_eq!(map_param_key("9lives"), None);
        assert_eq!(map_param_key("$meta"), None);
        assert_eq!(map_param_key(&"k".repeat(41)), None);
    }

    #[test]
    fn user_prop_key_mapping() {
        assert_eq!(map_user_prop_key("pro").as_deref(), Some("plan_tier"));
        assert_eq!(map_user_prop_key("appVersion").as_deref(), Some("app_version"));
        assert_eq!(map_user_prop_key("customFlag").as_deref(), Some("custom_flag"));
    }

    #[test]
    fn user_prop_key_reserved_and_length() {
        assert_eq!(map_user_prop_key("$email"), None);
        assert_eq!(map_user_prop_key(&"u".repeat(25)), None);
        assert!(map_user_prop_key(&"u".repeat(24)).is_some());
    }
}
