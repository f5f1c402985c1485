//! Record normalizer
//!
//! Turns one raw run payload, as delivered by the transport, into a canonical
//! [`Run`]. Every field has an explicit defaulting rule; the only payload that
//! is rejected is one without a string `name`.

use crate::jsonnan;
use crate::run::{Run, RunState, RunUser};
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as Json;
use std::collections::BTreeMap;

impl Run {
    /// Normalize a raw payload. Returns `None` when `name` is missing or not
    /// a string; every other anomaly falls back to a default.
    pub fn from_payload(payload: &Json) -> Option<Run> {
        let name = match payload.get("name") {
            Some(Json::String(name)) => name.clone(),
            _ => {
                tracing::debug!("Dropping run payload without a string name");
                return None;
            }
        };

        let id = string_field(payload, "id").unwrap_or_else(|| name.clone());

        Some(Run {
            id,
            state: string_field(payload, "state")
                .map(|s| RunState::parse(&s))
                .unwrap_or_default(),
            description: string_field(payload, "description").unwrap_or_default(),
            user: parse_user(payload.get("user")),
            host: string_field(payload, "host").unwrap_or_default(),
            created_at: payload.get("createdAt").and_then(parse_timestamp),
            heartbeat_at: payload.get("heartbeatAt").and_then(parse_timestamp),
            tags: parse_tags(payload.get("tags")),
            config: parse_config(payload.get("config")),
            summary: parse_summary(payload.get("summaryMetrics")),
            name,
        })
    }
}

fn string_field(payload: &Json, field: &str) -> Option<String> {
    payload.get(field).and_then(Json::as_str).map(str::to_string)
}

fn parse_user(user: Option<&Json>) -> RunUser {
    let Some(Json::Object(user)) = user else {
        return RunUser::default();
    };

    let name = user
        .get("username")
        .or_else(|| user.get("name"))
        .and_then(Json::as_str);
    let photo_url = user.get("photoUrl").and_then(Json::as_str);

    if name.is_none() && photo_url.is_none() {
        return RunUser::default();
    }
    RunUser {
        name: name.unwrap_or_default().to_string(),
        photo_url: photo_url.unwrap_or_default().to_string(),
    }
}

fn parse_tags(tags: Option<&Json>) -> Vec<String> {
    let Some(Json::Array(items)) = tags else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

/// Raw timestamps carry no zone and are UTC; a trailing `Z` is appended when
/// no zone indicator is present.
fn parse_timestamp(raw: &Json) -> Option<DateTime<Utc>> {
    let text = raw.as_str()?;
    let has_zone = text.ends_with('Z')
        || text.ends_with('z')
        || text
            .rfind(|c: char| c == '+' || c == '-')
            .map(|idx| idx > text.find('T').unwrap_or(usize::MAX))
            .unwrap_or(false);

    let with_zone = if has_zone {
        text.to_string()
    } else {
        format!("{}Z", text)
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&with_zone) {
        return Some(ts.with_timezone(&Utc));
    }
    // Timestamps written with a space separator
    match NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            tracing::debug!("Unparseable timestamp {:?}: {}", text, e);
            None
        }
    }
}

/// Decode a JSON-encoded field. Already-decoded objects are accepted as is.
fn decode_embedded(raw: Option<&Json>, field: &str) -> Option<Value> {
    match raw? {
        Json::String(text) => match jsonnan::parse(text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Unparseable {} payload: {}", field, e);
                None
            }
        },
        Json::Null => None,
        other => Some(Value::from_json(other.clone())),
    }
}

fn parse_config(raw: Option<&Json>) -> BTreeMap<String, Value> {
    let mut config = BTreeMap::new();
    let Some(Value::Object(entries)) = decode_embedded(raw, "config") else {
        return config;
    };

    for (key, wrapper) in entries {
        match wrapper {
            Value::Object(mut wrapper) => match wrapper.remove("value") {
                Some(value) => flatten_into(&mut config, key, value),
                None => {
                    config.insert(key, Value::Null);
                }
            },
            _ => {
                config.insert(key, Value::Null);
            }
        }
    }
    config
}

/// Flatten plain objects into dot-paths. Arrays and scalars are leaves.
pub fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: String, value: Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, inner) in map {
                flatten_into(out, format!("{}.{}", prefix, key), inner);
            }
        }
        leaf => {
            out.insert(prefix, leaf);
        }
    }
}

fn parse_summary(raw: Option<&Json>) -> BTreeMap<String, Value> {
    match decode_embedded(raw, "summary") {
        Some(Value::Object(summary)) => summary,
        Some(other) => {
            tracing::debug!("Summary is not an object: {:?}", other);
            BTreeMap::new()
        }
        None => BTreeMap::new(),
    }
}
