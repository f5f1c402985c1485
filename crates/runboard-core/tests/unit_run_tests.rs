//! Unit tests for run normalization and field lookup
//!
//! Exercises the defaulting rules of the record normalizer end to end.

use runboard_core::{Run, RunKey, RunState, RunUser, Value};
use serde_json::{json, Value as Json};
use std::collections::BTreeMap;

const CREATED_AT: &str = "2018-03-28T02:19:09.777";

fn valid_run_json() -> Json {
    json!({
        "id": "my_run_id",
        "name": "arun",
        "state": "running",
        "user": {"username": "mcgee", "photoUrl": "example.com"},
        "host": "angry.local",
        "createdAt": CREATED_AT,
        "heartbeatAt": CREATED_AT,
        "tags": ["a", "b"],
        "config": r#"{"akey": {"value": {"subkey": 14}}, "bkey": 19.3}"#,
        "summaryMetrics": r#"{"acc": 0.14}"#
    })
}

fn with(field: &str, value: Json) -> Json {
    let mut payload = valid_run_json();
    payload[field] = value;
    payload
}

fn without(field: &str) -> Json {
    let mut payload = valid_run_json();
    payload.as_object_mut().unwrap().remove(field);
    payload
}

// =============================================================================
// Normalizer
// =============================================================================

#[test]
fn test_works_with_valid_run() {
    let run = Run::from_payload(&valid_run_json()).expect("valid payload");

    let mut config = BTreeMap::new();
    config.insert("akey.subkey".to_string(), Value::Number(14.0));
    config.insert("bkey".to_string(), Value::Null);

    assert_eq!(run.id(), "my_run_id");
    assert_eq!(run.state(), RunState::Running);
    assert_eq!(run.tags(), ["a".to_string(), "b".to_string()]);
    assert_eq!(run.config(), &config);
    assert_eq!(run.summary().get("acc"), Some(&Value::Number(0.14)));

    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["createdAt"], json!("2018-03-28T02:19:09.777Z"));
    assert_eq!(json["heartbeatAt"], json!("2018-03-28T02:19:09.777Z"));
    assert_eq!(json["description"], json!(""));
}

#[test]
fn test_fails_without_name() {
    assert!(Run::from_payload(&without("name")).is_none());
}

#[test]
fn test_fails_with_non_string_name() {
    assert!(Run::from_payload(&with("name", json!(5))).is_none());
}

#[test]
fn test_defaults_without_user() {
    let run = Run::from_payload(&without("user")).unwrap();
    assert_eq!(run.user(), &RunUser::default());
}

#[test]
fn test_defaults_with_invalid_user() {
    let run = Run::from_payload(&with("user", json!([]))).unwrap();
    assert_eq!(run.user(), &RunUser::default());

    let run = Run::from_payload(&with("user", json!({"email": "x@y"}))).unwrap();
    assert_eq!(run.user().name, "");
    assert_eq!(run.user().photo_url, "");
}

#[test]
fn test_defaults_without_tags() {
    let run = Run::from_payload(&without("tags")).unwrap();
    assert!(run.tags().is_empty());
}

#[test]
fn test_defaults_with_invalid_tags() {
    let run = Run::from_payload(&with("tags", json!({"a": 5}))).unwrap();
    assert!(run.tags().is_empty());

    let run = Run::from_payload(&with("tags", json!([5]))).unwrap();
    assert!(run.tags().is_empty());

    let run = Run::from_payload(&with("tags", json!(["ok", 5]))).unwrap();
    assert!(run.tags().is_empty());
}

#[test]
fn test_heartbeat_absent_passes_through() {
    let run = Run::from_payload(&without("heartbeatAt")).unwrap();
    assert!(run.heartbeat_at().is_none());
    let json = serde_json::to_value(&run).unwrap();
    assert!(json.get("heartbeatAt").is_none());
}

#[test]
fn test_config_already_decoded_object() {
    let run = Run::from_payload(&with(
        "config",
        json!({"epochs": {"value": 10, "desc": "passes"}, "bad": {"desc": "no value"}}),
    ))
    .unwrap();
    assert_eq!(run.config().get("epochs"), Some(&Value::Number(10.0)));
    assert_eq!(run.config().get("bad"), Some(&Value::Null));
}

#[test]
fn test_tag_order_preserved() {
    let run = Run::from_payload(&with("tags", json!(["z", "a", "m"]))).unwrap();
    assert_eq!(run.tags(), ["z".to_string(), "a".to_string(), "m".to_string()]);
}

// =============================================================================
// Field lookup
// =============================================================================

#[test]
fn test_display_name_works() {
    let run = Run::from_payload(&valid_run_json()).unwrap();
    assert_eq!(run.display_name(), "arun");

    let run = Run::from_payload(&with("description", json!("baseline"))).unwrap();
    assert_eq!(run.display_name(), "baseline");
}

#[test]
fn test_get_value_works() {
    let run = Run::from_payload(&valid_run_json()).unwrap();
    assert_eq!(run.get_value(&RunKey::run("name")), Some(Value::from("arun")));
    assert_eq!(
        run.get_value(&"config:akey.subkey".parse().unwrap()),
        Some(Value::Number(14.0))
    );
    assert_eq!(run.get_value(&RunKey::config("bkey")), Some(Value::Null));
    assert_eq!(run.get_value(&RunKey::config("ckey")), None);
}
