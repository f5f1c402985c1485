//! Grouping engine
//!
//! Runs are grouped by the stringified value of a group key and optionally
//! subdivided by a subgroup key. Grouped views are served in two phases:
//!
//! - collapsed: one representative row per group (the first member in the
//!   current sort order) annotated with `groupCounts`
//! - expanded: the caller re-queries with a filter narrowed to one group or
//!   subgroup (see [`expand_group_filter`]) and a larger page
//!
//! Counts carried on rows:
//!
//! | row           | `groupCounts`                                   |
//! |---------------|-------------------------------------------------|
//! | group row     | `[groupSize]` or `[groupSize, subgroupCount]`   |
//! | subgroup row  | `[subgroupSize, groupSize]`                     |
//! | plain run row | empty                                           |

use runboard_core::{FilterNode, FilterOperator, Run, RunKey, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group and optional subgroup keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub group: RunKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<RunKey>,
}

impl Grouping {
    pub fn new(group: RunKey) -> Self {
        Self {
            group,
            subgroup: None,
        }
    }

    pub fn with_subgroup(mut self, subgroup: RunKey) -> Self {
        self.subgroup = Some(subgroup);
        self
    }
}

/// Which rows a grouped query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// One row per run
    #[default]
    Run,
    /// One representative row per group
    Group,
    /// One representative row per subgroup of the (already narrowed) runs
    Subgroup,
}

/// A display row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRow {
    #[serde(flatten)]
    pub run: Run,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_counts: Vec<usize>,
}

impl RunRow {
    pub fn plain(run: Run) -> Self {
        Self {
            run,
            group_counts: Vec::new(),
        }
    }
}

/// Runs sharing one group label
#[derive(Debug, Clone, PartialEq)]
pub struct RunGroup {
    pub label: String,
    pub runs: Vec<Run>,
    pub subgroups: Vec<RunGroup>,
}

impl RunGroup {
    pub fn size(&self) -> usize {
        self.runs.len()
    }
}

/// Label a run is grouped under. Null and absent values share the empty label.
pub fn group_label(run: &Run, key: &RunKey) -> String {
    run.get_value(key).map(|v| v.to_string()).unwrap_or_default()
}

/// Partition `runs` by `key`. Groups are ordered by label; members keep their
/// input order.
pub fn partition(runs: &[Run], key: &RunKey) -> Vec<RunGroup> {
    let mut buckets: BTreeMap<String, Vec<Run>> = BTreeMap::new();
    for run in runs {
        buckets
            .entry(group_label(run, key))
            .or_default()
            .push(run.clone());
    }
    buckets
        .into_iter()
        .map(|(label, runs)| RunGroup {
            label,
            runs,
            subgroups: Vec::new(),
        })
        .collect()
}

/// Partition `runs` by the group key, then each group by the subgroup key
pub fn group_runs(runs: &[Run], grouping: &Grouping) -> Vec<RunGroup> {
    let mut groups = partition(runs, &grouping.group);
    if let Some(subgroup) = &grouping.subgroup {
        for group in &mut groups {
            group.subgroups = partition(&group.runs, subgroup);
        }
    }
    groups
}

/// Display rows for `level`
pub fn group_rows(runs: &[Run], grouping: Option<&Grouping>, level: Level) -> Vec<RunRow> {
    let Some(grouping) = grouping else {
        return runs.iter().cloned().map(RunRow::plain).collect();
    };

    match level {
        Level::Run => runs.iter().cloned().map(RunRow::plain).collect(),
        Level::Group => group_runs(runs, grouping)
            .into_iter()
            .filter_map(|group| {
                let mut counts = vec![group.size()];
                if grouping.subgroup.is_some() {
                    counts.push(group.subgroups.len());
                }
                representative(group.runs, counts)
            })
            .collect(),
        Level::Subgroup => {
            let Some(subgroup) = &grouping.subgroup else {
                tracing::debug!("Subgroup level requested without a subgroup key");
                return group_rows(runs, Some(grouping), Level::Group);
            };
            let group_size = runs.len();
            partition(runs, subgroup)
                .into_iter()
                .filter_map(|sub| {
                    let counts = vec![sub.size(), group_size];
                    representative(sub.runs, counts)
                })
                .collect()
        }
    }
}

fn representative(runs: Vec<Run>, group_counts: Vec<usize>) -> Option<RunRow> {
    runs.into_iter().next().map(|run| RunRow { run, group_counts })
}

/// Filter for the expanded phase of the group containing `run`
pub fn expand_group_filter(filters: &FilterNode, grouping: &Grouping, run: &Run) -> FilterNode {
    FilterNode::and(vec![filters.clone(), equals(run, &grouping.group)])
}

/// Filter for the expanded phase of the subgroup containing `run`. Without a
/// subgroup key this is the group filter.
pub fn expand_subgroup_filter(filters: &FilterNode, grouping: &Grouping, run: &Run) -> FilterNode {
    let mut scoped = vec![filters.clone(), equals(run, &grouping.group)];
    if let Some(subgroup) = &grouping.subgroup {
        scoped.push(equals(run, subgroup));
    }
    FilterNode::and(scoped)
}

/// Members of the group labelled like `run` on `key`. The empty label holds
/// null, absent and empty values, which no single equality matches.
fn equals(run: &Run, key: &RunKey) -> FilterNode {
    match run.get_value(key).filter(|v| !v.to_string().is_empty()) {
        Some(value) => FilterNode::leaf(key.clone(), FilterOperator::Eq, value),
        None => FilterNode::or(vec![
            FilterNode::leaf(key.clone(), FilterOperator::Eq, Value::Null),
            FilterNode::leaf(key.clone(), FilterOperator::Eq, ""),
        ]),
    }
}
