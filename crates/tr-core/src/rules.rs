//! Static alias, rename, drop, and priority tables.
//!
//! Built once on first use and never mutated afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Legacy event names and the vendor name they map to.
const EVENT_NAME_ALIASES: &[(&str, &str)] = &[("track_pageview", "page_view")];

/// Per-segment renames applied to flattened parameter paths.
const PARAM_RENAMES: &[(&str, &str)] = &[
    ("page", "ui_page"),
    ("segment", "ui_segment"),
    ("module", "ui_module"),
    ("arg", "ui_arg"),
    ("control", "ui_control"),
    ("option", "ui_option"),
    ("key", "setting_key"),
    ("value", "setting_value"),
    ("docId", "doc_id"),
    ("workspaceId", "workspace_id"),
    ("serverId", "server_id"),
    ("docType", "doc_type"),
    ("docCount", "doc_count"),
    ("unreadCount", "unread_count"),
    ("withAttachment", "with_attachment"),
    ("withMention", "with_mention"),
    ("appName", "app_name"),
    ("recurring", "billing_cycle"),
    ("plan", "plan_name"),
    ("time", "duration_ms"),
    ("error", "error_code"),
    ("status", "result"),
    ("success", "result"),
    ("to", "target"),
    ("on", "enabled"),
];

const USER_PROP_RENAMES: &[(&str, &str)] = &[
    ("appVersion", "app_version"),
    ("editorVersion", "editor_version"),
    ("environment", "environment"),
    ("isDesktop", "is_desktop"),
    ("distribution", "distribution"),
    ("isSelfHosted", "is_self_hosted"),
    ("ai", "ai_enabled"),
    ("pro", "plan_tier"),
    ("quota", "quota_tier"),
];

/// Raw path segments that disqualify a parameter outright.
const DROP_PARAM_SEGMENTS: &[&str] = &["other", "instruction", "operation"];

/// Mapped keys that are never sent (identifiers).
const DROP_MAPPED_PARAMS: &[&str] = &["doc_id", "workspace_id", "server_id"];

/// Keys that sort ahead of everything else before the cap is applied.
pub const PRIORITY_KEYS: &[&str] = &[
    "ui_page",
    "ui_segment",
    "ui_module",
    "ui_control",
    "ui_option",
    "ui_arg",
    "type",
    "method",
    "mode",
    "plan_name",
    "billing_cycle",
    "role",
    "result",
    "error_code",
    "category",
    "doc_type",
    "item",
    "action",
    "target",
    "enabled",
    "setting_key",
    "setting_value",
    "duration_ms",
    "doc_count",
    "unread_count",
    "with_attachment",
    "with_mention",
];

/// User-property keys starting with this marker are never forwarded.
pub const RESERVED_USER_PROP_PREFIX: char = '$';

/// Mapped parameter key whose boolean value becomes `success`/`failure`.
pub const RESULT_KEY: &str = "result";

/// Mapped parameter key whose boolean value becomes `on`/`off`.
pub const ENABLED_KEY: &str = "enabled";

/// Raw user-property key whose boolean value becomes a plan tier token.
pub const PLAN_TIER_KEY: &str = "pro";

/// Tier tokens for [`PLAN_TIER_KEY`]: `(true, false)`.
pub const PLAN_TIER_TOKENS: (&str, &str) = ("pro", "free");

/// The complete rule set consulted by the grammar and sanitizers.
#[derive(Debug)]
pub struct RuleTables {
    event_aliases: HashMap<&'static str, &'static str>,
    param_renames: HashMap<&'static str, &'static str>,
    user_prop_renames: HashMap<&'static str, &'static str>,
    drop_segments: HashSet<&'static str>,
    drop_mapped: HashSet<&'static str>,
    priority: HashSet<&'static str>,
}

impl RuleTables {
    fn build() -> Self {
        Self {
            event_aliases: EVENT_NAME_ALIASES.iter().copied().collect(),
            param_renames: PARAM_RENAMES.iter().copied().collect(),
            user_prop_renames: USER_PROP_RENAMES.iter().copied().collect(),
            drop_segments: DROP_PARAM_SEGMENTS.iter().copied().collect(),
            drop_mapped: DROP_MAPPED_PARAMS.iter().copied().collect(),
            priority: PRIORITY_KEYS.iter().copied().collect(),
        }
    }

    pub fn event_alias(&self, name: &str) -> Option<&'static str> {
        self.event_aliases.get(name).copied()
    }

    pub fn param_rename(&self, segment: &str) -> Option<&'static str> {
        self.param_renames.get(segment).copied()
    }

    pub fn user_prop_rename(&self, key: &str) -> Option<&'static str> {
        self.user_prop_renames.get(key).copied()
    }

    /// Whether a raw (pre-rename) path segment disqualifies its parameter.
    pub fn is_dropped_segment(&self, segment: &str) -> bool {
        self.drop_segments.contains(segment)
    }

    /// Whether a path contains any disqualifying segment.
    pub fn is_dropped_path(&self, path: &str) -> bool {
        path.split('.').any(|segment| self.is_dropped_segment(segment))
    }

    pub fn is_dropped_mapped_key(&self, key: &str) -> bool {
        self.drop_mapped.contains(key)
    }

    pub fn is_priority_key(&self, key: &str) -> bool {
        self.priority.contains(key)
    }
}

static RULES: LazyLock<RuleTables> = LazyLock::new(RuleTables::build);

/// The process-wide rule tables.
pub fn rules() -> &'static RuleTables {
    &RULES
}
