//! Run set merger
//!
//! Folds a batch of raw payloads into the current run set: runs are replaced
//! by id in place, new ids are appended in incoming order, and runs missing
//! from the batch are retained.

use runboard_core::Run;
use serde::Serialize;
use serde_json::Value as Json;
use std::collections::HashMap;

/// Counters reported by one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Payloads normalized into runs
    pub normalized: usize,
    /// Payloads identical to the previous batch whose run was kept as is
    pub reused: usize,
    /// Payloads that failed normalization
    pub dropped: usize,
    /// Runs added with a new id
    pub appended: usize,
}

/// Identity of a raw payload, falling back to its name like the normalizer
fn payload_id(payload: &Json) -> Option<&str> {
    payload
        .get("id")
        .and_then(Json::as_str)
        .or_else(|| payload.get("name").and_then(Json::as_str))
}

/// Merge `batch` into `current`.
///
/// A payload equal to the one with the same id in `previous_batch` is not
/// normalized again when its run is already present.
pub fn merge_runs(current: &[Run], previous_batch: &[Json], batch: &[Json]) -> (Vec<Run>, MergeStats) {
    let previous: HashMap<&str, &Json> = previous_batch
        .iter()
        .filter_map(|payload| payload_id(payload).map(|id| (id, payload)))
        .collect();

    let mut runs = current.to_vec();
    let mut index: HashMap<String, usize> = runs
        .iter()
        .enumerate()
        .map(|(i, run)| (run.id().to_string(), i))
        .collect();
    let mut stats = MergeStats::default();

    for payload in batch {
        if let Some(id) = payload_id(payload) {
            if index.contains_key(id) && previous.get(id).is_some_and(|prev| *prev == payload) {
                stats.reused += 1;
                continue;
            }
        }

        let Some(run) = Run::from_payload(payload) else {
            stats.dropped += 1;
            continue;
        };
        stats.normalized += 1;

        match index.get(run.id()) {
            Some(&i) => runs[i] = run,
            None => {
                index.insert(run.id().to_string(), runs.len());
                runs.push(run);
                stats.appended += 1;
            }
        }
    }

    tracing::debug!(
        normalized = stats.normalized,
        reused = stats.reused,
        dropped = stats.dropped,
        appended = stats.appended,
        total = runs.len(),
        "Merged run batch"
    );
    (runs, stats)
}
