//! End-to-end behavior of the transport gate against an in-memory host.

use chrono::{TimeZone, Utc};
use serde_json::json;
use tr_common::{PropBag, PropValue, Scalar};
use tr_config::TrackerConfig;
use tr_core::gate::{GtagCall, MemoryHost, MountPoint, PageLocation, TransportGate};

const MEASUREMENT_ID: &str = "G-TEST123";

fn config() -> TrackerConfig {
    TrackerConfig::default().with_measurement_id(MEASUREMENT_ID)
}

fn gate_with(host: MemoryHost) -> TransportGate<MemoryHost> {
    TransportGate::new(config(), host)
}

fn gate() -> TransportGate<MemoryHost> {
    gate_with(MemoryHost::new())
}

fn events(gate: &TransportGate<MemoryHost>) -> Vec<&GtagCall> {
    gate.host()
        .data_layer()
        .iter()
        .filter(|call| call.command() == "event")
        .collect()
}

fn last_params(gate: &TransportGate<MemoryHost>) -> serde_json::Value {
    let call = events(gate).pop().expect("an event was sent");
    serde_json::to_value(call.params().expect("event has params")).unwrap()
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn first_call_bootstraps_then_sends_event() {
    let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
    let mut gate = gate_with(MemoryHost::new().with_fixed_clock(at));
    gate.track("docCreated", &PropBag::new().with("page", "editor"));

    let wire: Vec<serde_json::Value> = gate
        .host()
        .data_layer()
        .iter()
        .map(|call| serde_json::to_value(call).unwrap())
        .collect();
    assert_eq!(
        wire,
        vec![
            json!(["js", "2026-03-04T05:06:07.000Z"]),
            json!(["config", MEASUREMENT_ID, {"send_page_view": false}]),
            json!(["event", "doc_created", {"ui_page": "editor"}]),
        ]
    );
}

#[test]
fn repeated_calls_inject_once_and_configure_once() {
    let mut gate = gate();
    for _ in 0..5 {
        gate.track("click", &PropBag::new());
        gate.pageview(&PropBag::new());
    }

    let scripts = gate.host().scripts();
    assert_eq!(scripts.len(), 1);
    let (mount, tag) = &scripts[0];
    assert_eq!(*mount, MountPoint::Head);
    assert_eq!(tag.id, "ga4-gtag");
    assert_eq!(
        tag.src,
        "https://www.googletagmanager.com/gtag/js?id=G-TEST123"
    );
    assert!(tag.is_async);

    let commands: Vec<&str> = gate.host().data_layer().iter().map(GtagCall::command).collect();
    assert_eq!(commands.iter().filter(|c| **c == "js").count(), 1);
    assert_eq!(commands.iter().filter(|c| **c == "config").count(), 1);
    assert_eq!(commands.iter().filter(|c| **c == "event").count(), 10);
}

#[test]
fn removed_script_is_reinjected_without_reconfiguring() {
    let mut gate = gate();
    gate.track("click", &PropBag::new());
    assert!(gate.host_mut().remove_element("ga4-gtag"));

    gate.track("click", &PropBag::new());
    assert_eq!(gate.host().scripts().len(), 1);
    let js = gate
        .host()
        .data_layer()
        .iter()
        .filter(|call| call.command() == "js")
        .count();
    assert_eq!(js, 1);
}

#[test]
fn script_mounts_on_body_then_root() {
    let mut gate = gate_with(MemoryHost::new().without_head());
    gate.track("click", &PropBag::new());
    assert_eq!(gate.host().scripts()[0].0, MountPoint::Body);

    let mut gate = gate_with(MemoryHost::new().without_head().without_body());
    gate.track("click", &PropBag::new());
    assert_eq!(gate.host().scripts()[0].0, MountPoint::Root);
}

#[test]
fn existing_queue_is_preserved() {
    let earlier = GtagCall::SetUserId(Some("early".into()));
    let mut gate = gate_with(MemoryHost::new().with_existing_queue(vec![earlier.clone()]));
    gate.track("click", &PropBag::new());

    let queue = gate.host().data_layer();
    assert_eq!(queue[0], earlier);
    assert_eq!(queue[1].command(), "js");
}

#[test]
fn disabled_gate_never_touches_the_host() {
    let mut gate = gate();
    gate.set_enabled(false);
    gate.track("click", &PropBag::new());
    gate.pageview(&PropBag::new());
    gate.set_user_id(Some("u1"));
    gate.reset();

    assert!(gate.host().scripts().is_empty());
    assert!(gate.host().data_layer().is_empty());
    assert!(!gate.state().configured);
}

#[test]
fn missing_measurement_id_is_inert() {
    let mut gate = TransportGate::new(TrackerConfig::default(), MemoryHost::new());
    gate.track("click", &PropBag::new().with("page", "x"));
    gate.set_user_properties(&PropBag::new().with("pro", true));
    assert!(gate.host().scripts().is_empty());
    assert!(gate.host().data_layer().is_empty());
}

// ============================================================================
// Events and parameters
// ============================================================================

#[test]
fn legacy_pageview_name_is_aliased() {
    let mut gate = gate();
    gate.track("track_pageview", &PropBag::new());
    assert_eq!(events(&gate)[0].event_name(), Some("page_view"));
}

#[test]
fn excluded_segments_and_identifiers_are_dropped() {
    let mut gate = gate();
    let props = PropBag::new()
        .with("operation", PropBag::new().with("kind", "merge"))
        .with("other", "x")
        .with("docId", "abc")
        .with("workspaceId", "w1")
        .with("control", "button");
    gate.track("action", &props);
    assert_eq!(last_params(&gate), json!({"ui_control": "button"}));
}

#[test]
fn nested_values_flatten_rename_and_remap() {
    let mut gate = gate();
    let props = PropBag::new()
        .with("extra", PropBag::new().with("docType", "page").with("status", true))
        .with("success", false)
        .with("on", false)
        .with("time", 12.5);
    gate.track("settingChanged", &props);

    assert_eq!(events(&gate)[0].event_name(), Some("setting_changed"));
    assert_eq!(
        last_params(&gate),
        json!({
            "result": "failure",
            "enabled": "off",
            "duration_ms": 12.5,
            "extra_doc_type": "page",
            "extra_result": 1,
        })
    );
}

#[test]
fn long_strings_truncate_to_hundred_chars() {
    let mut gate = gate();
    gate.track("click", &PropBag::new().with("label", "x".repeat(150)));
    let params = events(&gate)[0].params().unwrap();
    let label = params.get("label").and_then(Scalar::as_str).unwrap();
    assert_eq!(label.chars().count(), 100);
}

#[test]
fn invalid_event_name_sends_nothing() {
    let mut gate = gate();
    gate.track("9lives", &PropBag::new().with("page", "x"));
    gate.track(&"a".repeat(41), &PropBag::new());
    assert!(events(&gate).is_empty());
}

#[test]
fn event_params_are_capped_at_twenty_five() {
    let mut gate = gate();
    let props: PropBag = (0..40i32).map(|i| (format!("k{i}"), PropValue::from(i))).collect();
    gate.track("bulk", &props);
    assert_eq!(events(&gate)[0].params().unwrap().len(), 25);
}

// ============================================================================
// Page views
// ============================================================================

#[test]
fn pageview_uses_current_page() {
    let location = PageLocation::parse("https://app.example.com/ws/1?tab=a#top").unwrap();
    let mut gate = gate_with(MemoryHost::new().with_location(location).with_title("Editor"));
    gate.pageview(&PropBag::new().with("page", "doc"));

    let call = events(&gate)[0];
    assert_eq!(call.event_name(), Some("page_view"));
    assert_eq!(
        last_params(&gate),
        json!({
            "page_location": "https://app.example.com/ws/1?tab=a#top",
            "page_path": "/ws/1?tab=a",
            "page_title": "Editor",
            "ui_page": "doc",
        })
    );
}

#[test]
fn pageview_location_override() {
    let location = PageLocation::parse("https://app.example.com/current").unwrap();
    let mut gate = gate_with(MemoryHost::new().with_location(location));
    gate.pageview(&PropBag::new().with("location", "https://example.com/foo?x=1"));

    let params = last_params(&gate);
    assert_eq!(params["page_location"], "https://example.com/foo?x=1");
    assert_eq!(params["page_path"], "/foo?x=1");
    assert!(params.get("location").is_none());
}

#[test]
fn pageview_malformed_override_falls_back_to_current_path() {
    let location = PageLocation::parse("https://app.example.com/current?q=1").unwrap();
    let mut gate = gate_with(MemoryHost::new().with_location(location));
    gate.pageview(&PropBag::new().with("location", "http://[::1"));

    let params = last_params(&gate);
    assert_eq!(params["page_location"], "http://[::1");
    assert_eq!(params["page_path"], "/current?q=1");
}

#[test]
fn pageview_extras_are_capped_at_twenty_two() {
    let mut gate = gate();
    let props: PropBag = (0..40i32).map(|i| (format!("k{i}"), PropValue::from(i))).collect();
    gate.pageview(&props);
    assert_eq!(events(&gate)[0].params().unwrap().len(), 25);
}

// ============================================================================
// User identity
// ============================================================================

#[test]
fn plan_tier_from_pro_flag() {
    let mut gate = gate();
    gate.set_user_properties(&PropBag::new().with("pro", true).with("isDesktop", true));
    gate.set_user_properties(&PropBag::new().with("pro", false));

    let sets: Vec<serde_json::Value> = gate
        .host()
        .data_layer()
        .iter()
        .filter(|call| call.command() == "set")
        .map(|call| serde_json::to_value(call).unwrap())
        .collect();
    assert_eq!(
        sets,
        vec![
            json!(["set", "user_properties", {"plan_tier": "pro", "is_desktop": "1"}]),
            json!(["set", "user_properties", {"plan_tier": "free"}]),
        ]
    );
}

#[test]
fn user_property_values_truncate_to_thirty_six() {
    let mut gate = gate();
    gate.set_user_properties(&PropBag::new().with("appVersion", "v".repeat(50)));
    let Some(GtagCall::SetUserProperties(props)) = gate.host().data_layer().last() else {
        panic!("expected user properties");
    };
    assert_eq!(props.get("app_version").map(|v| v.chars().count()), Some(36));
}

#[test]
fn empty_user_properties_send_nothing() {
    let mut gate = gate();
    gate.set_user_properties(&PropBag::new().with("$secret", "x").with("1bad", "y"));
    let sets = gate
        .host()
        .data_layer()
        .iter()
        .filter(|call| call.command() == "set")
        .count();
    assert_eq!(sets, 0);
}

#[test]
fn set_user_id_and_reset() {
    let mut gate = gate();
    gate.set_user_id(Some("user-42"));
    gate.reset();

    let tail: Vec<serde_json::Value> = gate.host().data_layer()[2..]
        .iter()
        .map(|call| serde_json::to_value(call).unwrap())
        .collect();
    assert_eq!(
        tail,
        vec![
            json!(["set", "user_id", "user-42"]),
            json!(["set", "user_id", null]),
            json!(["set", "user_properties", {}]),
        ]
    );
}
