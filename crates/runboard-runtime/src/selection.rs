//! Range selections
//!
//! Interactive brushing on a chart axis produces an inclusive numeric range
//! per axis. Selections are stored as ordinary filter trees in the canonical
//! shape `OR[AND[leaves...]]` so they can be evaluated, serialized and shared
//! exactly like query filters.

use runboard_core::{CoreError, FilterNode, FilterOperator, GroupOperator, RunKey, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive range on one axis; `None` is unbounded on that side
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl Bounds {
    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        Self { low, high }
    }

    pub fn is_unbounded(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }
}

/// Selection matching every run
pub fn all() -> FilterNode {
    FilterNode::or(vec![FilterNode::and(Vec::new())])
}

/// Selection matching no run
pub fn none() -> FilterNode {
    FilterNode::or(Vec::new())
}

/// Effective range for `key`: the intersection of every bound on that key
pub fn bounds(selection: &FilterNode, key: &RunKey) -> Bounds {
    let mut result = Bounds::default();
    for (leaf_key, op, value) in selection.leaves() {
        if leaf_key != key {
            continue;
        }
        let Some(v) = value.coerce_number() else {
            continue;
        };
        if op.is_lower_bound() {
            result.low = Some(result.low.map_or(v, |low| low.max(v)));
        } else if op.is_upper_bound() {
            result.high = Some(result.high.map_or(v, |high| high.min(v)));
        }
    }
    result
}

/// Replace the `(key, op)` bound with `value` (or remove it when `None`).
///
/// Setting the same axis twice overwrites. When the resulting low and high
/// are equal the key's bounds are cleared entirely, since a zero-width brush
/// means no constraint.
pub fn add_bound(
    selection: &FilterNode,
    key: &RunKey,
    op: FilterOperator,
    value: Option<f64>,
) -> FilterNode {
    let (mut group, rest) = split(selection);
    group.retain(|node| !is_bound_on(node, key, |leaf_op| leaf_op == op));
    if let Some(v) = value {
        group.push(FilterNode::leaf(key.clone(), op, v));
    }

    let effective = bounds(&FilterNode::and(group.clone()), key);
    if let (Some(low), Some(high)) = (effective.low, effective.high) {
        if low == high {
            tracing::debug!("Degenerate range on {} cleared", key);
            group.retain(|node| !is_bound_on(node, key, |op| op.is_ordering()));
        }
    }

    let mut filters = Vec::with_capacity(rest.len() + 1);
    filters.push(FilterNode::and(group));
    filters.extend(rest);
    FilterNode::or(filters)
}

/// Set both ends of the range on `key`
pub fn set_bounds(selection: &FilterNode, key: &RunKey, range: Bounds) -> FilterNode {
    let selection = add_bound(selection, key, FilterOperator::Ge, range.low);
    add_bound(&selection, key, FilterOperator::Le, range.high)
}

fn is_bound_on(node: &FilterNode, key: &RunKey, op_matches: impl Fn(FilterOperator) -> bool) -> bool {
    matches!(node, FilterNode::Leaf { key: k, op, .. } if k == key && op_matches(*op))
}

/// Split a selection into the children of its editable `AND` group and the
/// remaining `OR` branches. `none()` yields an empty group, so adding a bound
/// to it produces a usable range selection.
fn split(selection: &FilterNode) -> (Vec<FilterNode>, Vec<FilterNode>) {
    match selection {
        FilterNode::Group {
            op: GroupOperator::Or,
            filters,
        } => match filters.split_first() {
            None => (Vec::new(), Vec::new()),
            Some((
                FilterNode::Group {
                    op: GroupOperator::And,
                    filters: inner,
                },
                rest,
            )) => (inner.clone(), rest.to_vec()),
            Some(_) => (vec![selection.clone()], Vec::new()),
        },
        FilterNode::Group {
            op: GroupOperator::And,
            filters,
        } => (filters.clone(), Vec::new()),
        other => (vec![other.clone()], Vec::new()),
    }
}

/// Per-axis ranges, convertible to and from the filter form. Serializes as a
/// map keyed by `section:name`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, Bounds>",
    try_from = "BTreeMap<String, Bounds>"
)]
pub struct SelectionBounds(pub BTreeMap<RunKey, Bounds>);

impl From<SelectionBounds> for BTreeMap<String, Bounds> {
    fn from(bounds: SelectionBounds) -> Self {
        bounds
            .0
            .into_iter()
            .map(|(key, range)| (key.display_key(), range))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, Bounds>> for SelectionBounds {
    type Error = CoreError;

    fn try_from(raw: BTreeMap<String, Bounds>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(key, range)| Ok((key.parse::<RunKey>()?, range)))
            .collect::<Result<BTreeMap<_, _>, CoreError>>()
            .map(SelectionBounds)
    }
}

impl SelectionBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: RunKey, range: Bounds) {
        self.0.insert(key, range);
    }

    pub fn get(&self, key: &RunKey) -> Option<&Bounds> {
        self.0.get(key)
    }

    /// Read the ranges of `keys` out of a selection tree; unbounded axes are
    /// omitted.
    pub fn from_filter<'a>(selection: &FilterNode, keys: impl IntoIterator<Item = &'a RunKey>) -> Self {
        let mut out = Self::new();
        for key in keys {
            let range = bounds(selection, key);
            if !range.is_unbounded() {
                out.insert(key.clone(), range);
            }
        }
        out
    }

    /// Equivalent `AND` of `>=`/`<=` comparisons
    pub fn to_filter(&self) -> FilterNode {
        let mut leaves = Vec::new();
        for (key, range) in &self.0 {
            if let Some(low) = range.low {
                leaves.push(FilterNode::leaf(key.clone(), FilterOperator::Ge, Value::Number(low)));
            }
            if let Some(high) = range.high {
                leaves.push(FilterNode::leaf(key.clone(), FilterOperator::Le, Value::Number(high)));
            }
        }
        FilterNode::and(leaves)
    }
}
