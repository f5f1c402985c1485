//! Reading request and run files
//!
//! Files ending in `.yaml`/`.yml` are read as YAML, everything else as JSON.
//! Run batches may contain bare `NaN`/`Infinity` metric values inside their
//! embedded JSON strings; those are handled by the normalizer, not here.

use anyhow::{Context, Result};
use runboard_sdk::{Query, RunsRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Json;
use std::path::Path;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Read a JSON or YAML file into `T`
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&text).with_context(|| format!("Invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Raw run payloads: an array of objects, or `{"runs": [...]}`
pub fn load_batch(path: &Path) -> Result<Vec<Json>> {
    let json: Json = read_file(path)?;
    match json {
        Json::Array(items) => Ok(items),
        Json::Object(mut obj) => match obj.remove("runs") {
            Some(Json::Array(items)) => Ok(items),
            _ => anyhow::bail!("{} has no `runs` array", path.display()),
        },
        _ => anyhow::bail!("{} is not a run batch", path.display()),
    }
}

/// A single query
pub fn load_query(path: &Path) -> Result<Query> {
    read_file(path)
}

/// One request or a sequence of requests, replayed in order
pub fn load_requests(path: &Path) -> Result<Vec<RunsRequest>> {
    let requests: OneOrMany<RunsRequest> = read_file(path)?;
    Ok(requests.into_vec())
}
