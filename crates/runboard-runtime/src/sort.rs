//! Sort engine

use runboard_core::{Run, RunKey, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Pseudo-key that sorts by membership in the current selection
pub const SELECTED_SORT_KEY: &str = "selected";

/// Sort order requested by a query. `name` is a key in `section:name` form;
/// `None` keeps the input order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub name: Option<String>,
    pub ascending: bool,
}

impl SortSpec {
    pub fn by(name: impl Into<String>, ascending: bool) -> Self {
        Self {
            name: Some(name.into()),
            ascending,
        }
    }
}

enum SortKey {
    Selected,
    Field(RunKey),
}

/// Stable sort of `runs` by `spec`.
///
/// Numbers compare numerically, everything else as case-sensitive strings.
/// Runs whose value is null or absent go last in both directions.
/// `selected_ids` holds the ids of currently selected runs, used by the
/// `selected` pseudo-key.
pub fn sort_runs(spec: &SortSpec, runs: Vec<Run>, selected_ids: &HashSet<String>) -> Vec<Run> {
    let Some(name) = spec.name.as_deref() else {
        return runs;
    };
    let key = if name == SELECTED_SORT_KEY {
        SortKey::Selected
    } else {
        match name.parse::<RunKey>() {
            Ok(key) => SortKey::Field(key),
            Err(e) => {
                tracing::debug!("Ignoring sort on {:?}: {}", name, e);
                return runs;
            }
        }
    };

    let mut decorated: Vec<(Option<Value>, Run)> = runs
        .into_iter()
        .map(|run| {
            let value = match &key {
                SortKey::Selected => Some(Value::Bool(selected_ids.contains(run.id()))),
                SortKey::Field(key) => run.get_value(key).filter(|v| !v.is_null()),
            };
            (value, run)
        })
        .collect();

    decorated.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.compare(b);
            if spec.ascending {
                ord
            } else {
                ord.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    decorated.into_iter().map(|(_, run)| run).collect()
}
