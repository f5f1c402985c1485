//! The canonical run record
//!
//! A `Run` is only ever built by the normalizer (`Run::from_payload`) or
//! deserialized from a snapshot previously produced by it. It has no setters:
//! an update to a run is a new `Run` value.

use crate::key::{RunKey, Section};
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Finished,
    Killed,
    Crashed,
    Failed,
    #[default]
    Unknown,
}

impl RunState {
    pub fn parse(state: &str) -> Self {
        match state {
            "running" => RunState::Running,
            "finished" => RunState::Finished,
            "killed" => RunState::Killed,
            "crashed" => RunState::Crashed,
            "failed" => RunState::Failed,
            _ => RunState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Finished => "finished",
            RunState::Killed => "killed",
            RunState::Crashed => "crashed",
            RunState::Failed => "failed",
            RunState::Unknown => "unknown",
        }
    }
}

/// Owner of a run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunUser {
    pub name: String,
    pub photo_url: String,
}

/// Canonical record for one experiment execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) state: RunState,
    pub(crate) description: String,
    pub(crate) user: RunUser,
    pub(crate) host: String,
    #[serde(with = "iso_timestamp", default)]
    pub(crate) created_at: Option<DateTime<Utc>>,
    #[serde(
        with = "iso_timestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) heartbeat_at: Option<DateTime<Utc>>,
    pub(crate) tags: Vec<String>,
    pub(crate) config: BTreeMap<String, Value>,
    #[serde(deserialize_with = "deserialize_summary")]
    pub(crate) summary: BTreeMap<String, Value>,
}

/// Summaries come from the NaN-tolerant parser, so `"NaN"`-style strings in a
/// snapshot are the serialized form of non-finite metrics.
fn deserialize_summary<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let summary = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(summary
        .into_iter()
        .map(|(name, value)| (name, value.restore_non_finite()))
        .collect())
}

/// Run section fields addressable through `run:<name>`
pub const RUN_FIELDS: &[&str] = &[
    "name",
    "displayName",
    "state",
    "description",
    "host",
    "username",
    "createdAt",
    "heartbeatAt",
    "runtime",
];

impl Run {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn user(&self) -> &RunUser {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn heartbeat_at(&self) -> Option<DateTime<Utc>> {
        self.heartbeat_at
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn config(&self) -> &BTreeMap<String, Value> {
        &self.config
    }

    pub fn summary(&self) -> &BTreeMap<String, Value> {
        &self.summary
    }

    /// Name shown to users: the description when set, otherwise the run name
    pub fn display_name(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    /// Seconds between creation and the last heartbeat
    pub fn runtime_secs(&self) -> Option<f64> {
        let created = self.created_at?;
        let heartbeat = self.heartbeat_at?;
        Some((heartbeat - created).num_milliseconds() as f64 / 1000.0)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Resolve a key against this run.
    ///
    /// Returns `None` when the field does not exist on this run; a config key
    /// that exists but could not be resolved is `Some(Value::Null)`.
    pub fn get_value(&self, key: &RunKey) -> Option<Value> {
        match &key.section {
            Section::Run => self.run_field(&key.name),
            Section::Config => self.config.get(&key.name).cloned(),
            Section::Summary => self.summary.get(&key.name).cloned(),
            Section::Tags => Some(Value::Bool(self.has_tag(&key.name))),
            Section::Unknown(_) => None,
        }
    }

    fn run_field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::from(self.id.as_str()),
            "name" => Value::from(self.name.as_str()),
            "displayName" => Value::from(self.display_name()),
            "state" => Value::from(self.state.as_str()),
            "description" => Value::from(self.description.as_str()),
            "host" => Value::from(self.host.as_str()),
            "username" => Value::from(self.user.name.as_str()),
            "userPhotoUrl" => Value::from(self.user.photo_url.as_str()),
            "createdAt" => Value::String(iso_timestamp::format(self.created_at?)),
            "heartbeatAt" => Value::String(iso_timestamp::format(self.heartbeat_at?)),
            "runtime" => Value::Number(self.runtime_secs()?),
            _ => return None,
        };
        Some(value)
    }
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix
pub mod iso_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ts {
            Some(ts) => serializer.serialize_str(&format(*ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(text) => DateTime::parse_from_rfc3339(&text)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
