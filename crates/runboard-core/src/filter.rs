//! Filter trees
//!
//! A filter is a tree of `AND`/`OR` groups whose leaves compare one run field
//! against a literal:
//!
//! ```json
//! {"op": "OR", "filters": [
//!   {"op": "AND", "filters": [
//!     {"key": {"section": "tags", "name": "hidden"}, "op": "=", "value": false},
//!     {"key": {"section": "config", "name": "lr"}, "op": "<", "value": 0.1}
//!   ]}
//! ]}
//! ```
//!
//! The same shape is used for query filters, selections and the scoped filters
//! of grouped expansion. Parsing never fails: a node with an unrecognized shape
//! is kept as [`FilterNode::Invalid`] and evaluates to false.
//!
//! ## Supported Operators
//! - `=` (equal), `!=` (not equal)
//! - `<`, `<=`, `>`, `>=` (numeric comparison)
//! - `=~` (regex match against the stringified field)

use crate::error::{CoreError, Result};
use crate::key::RunKey;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use std::fmt;

/// Logical operator of a group node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl GroupOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupOperator::And => "AND",
            GroupOperator::Or => "OR",
        }
    }

    fn parse(op: &str) -> Option<Self> {
        match op {
            "AND" => Some(GroupOperator::And),
            "OR" => Some(GroupOperator::Or),
            _ => None,
        }
    }
}

/// Comparison operator of a leaf node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equal (=)
    #[serde(rename = "=")]
    Eq,
    /// Not equal (!=)
    #[serde(rename = "!=")]
    Ne,
    /// Less than (<)
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal (<=)
    #[serde(rename = "<=")]
    Le,
    /// Greater than (>)
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal (>=)
    #[serde(rename = ">=")]
    Ge,
    /// Regex match (=~)
    #[serde(rename = "=~")]
    Regex,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Lt => "<",
            FilterOperator::Le => "<=",
            FilterOperator::Gt => ">",
            FilterOperator::Ge => ">=",
            FilterOperator::Regex => "=~",
        }
    }

    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(FilterOperator::Eq),
            "!=" => Some(FilterOperator::Ne),
            "<" => Some(FilterOperator::Lt),
            "<=" => Some(FilterOperator::Le),
            ">" => Some(FilterOperator::Gt),
            ">=" => Some(FilterOperator::Ge),
            "=~" => Some(FilterOperator::Regex),
            _ => None,
        }
    }

    /// Returns true for `>` and `>=`
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, FilterOperator::Gt | FilterOperator::Ge)
    }

    /// Returns true for `<` and `<=`
    pub fn is_upper_bound(&self) -> bool {
        matches!(self, FilterOperator::Lt | FilterOperator::Le)
    }

    /// Returns true if this is a numeric ordering operator
    pub fn is_ordering(&self) -> bool {
        self.is_lower_bound() || self.is_upper_bound()
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of a filter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Json", into = "Json")]
pub enum FilterNode {
    /// `AND`/`OR` over the child filters
    Group {
        op: GroupOperator,
        filters: Vec<FilterNode>,
    },
    /// Comparison of one run field against a literal
    Leaf {
        key: RunKey,
        op: FilterOperator,
        value: Value,
    },
    /// A node whose shape was not recognized, kept verbatim
    Invalid(Json),
}

impl FilterNode {
    pub fn and(filters: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            op: GroupOperator::And,
            filters,
        }
    }

    pub fn or(filters: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            op: GroupOperator::Or,
            filters,
        }
    }

    pub fn leaf(key: RunKey, op: FilterOperator, value: impl Into<Value>) -> Self {
        FilterNode::Leaf {
            key,
            op,
            value: value.into(),
        }
    }

    /// The filter new views start from: runs not tagged `hidden`
    pub fn default_run_filter() -> Self {
        FilterNode::or(vec![FilterNode::and(vec![FilterNode::leaf(
            RunKey::tag("hidden"),
            FilterOperator::Eq,
            false,
        )])])
    }

    /// Number of comparison leaves in the tree
    pub fn count_individual(&self) -> usize {
        match self {
            FilterNode::Group { filters, .. } => filters.iter().map(Self::count_individual).sum(),
            FilterNode::Leaf { .. } => 1,
            FilterNode::Invalid(_) => 0,
        }
    }

    /// All comparison leaves, depth first
    pub fn leaves(&self) -> Vec<(&RunKey, FilterOperator, &Value)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(&'a RunKey, FilterOperator, &'a Value)>) {
        match self {
            FilterNode::Group { filters, .. } => {
                for child in filters {
                    child.collect_leaves(out);
                }
            }
            FilterNode::Leaf { key, op, value } => out.push((key, *op, value)),
            FilterNode::Invalid(_) => {}
        }
    }

    /// Return a copy of the tree with `node` appended to the group reached by
    /// following child indices in `path` (an empty path is the root).
    pub fn group_push(&self, path: &[usize], node: FilterNode) -> Result<FilterNode> {
        let mut root = self.clone();
        let mut current = &mut root;
        for &index in path {
            current = match current {
                FilterNode::Group { filters, .. } => filters
                    .get_mut(index)
                    .ok_or_else(|| CoreError::InvalidFilterPath(path.to_vec()))?,
                _ => return Err(CoreError::InvalidFilterPath(path.to_vec())),
            };
        }
        match current {
            FilterNode::Group { filters, .. } => {
                filters.push(node);
                Ok(root)
            }
            _ => Err(CoreError::InvalidFilterPath(path.to_vec())),
        }
    }

    /// Encode as a URL query parameter for shareable links
    pub fn to_url(&self) -> String {
        let json: Json = self.clone().into();
        urlencoding::encode(&json.to_string()).into_owned()
    }

    /// Decode a filter produced by [`FilterNode::to_url`]
    pub fn from_url(param: &str) -> Result<FilterNode> {
        let decoded =
            urlencoding::decode(param).map_err(|e| CoreError::InvalidFilter(e.to_string()))?;
        let json: Json = serde_json::from_str(&decoded)?;
        Ok(FilterNode::from(json))
    }
}

impl From<Json> for FilterNode {
    fn from(json: Json) -> Self {
        match parse_node(&json) {
            Some(node) => node,
            None => {
                tracing::warn!("Unrecognized filter shape: {}", json);
                FilterNode::Invalid(json)
            }
        }
    }
}

fn parse_node(json: &Json) -> Option<FilterNode> {
    let obj = json.as_object()?;
    let op = obj.get("op")?.as_str()?;

    if let Some(group_op) = GroupOperator::parse(op) {
        let children = obj
            .get("filters")
            .or_else(|| obj.get("children"))?
            .as_array()?;
        return Some(FilterNode::Group {
            op: group_op,
            filters: children.iter().cloned().map(FilterNode::from).collect(),
        });
    }

    let op = FilterOperator::parse(op)?;
    let key: RunKey = serde_json::from_value(obj.get("key")?.clone()).ok()?;
    let value = obj
        .get("value")
        .cloned()
        .map(Value::from_json)
        .unwrap_or(Value::Null);
    Some(FilterNode::Leaf { key, op, value })
}

impl From<FilterNode> for Json {
    fn from(node: FilterNode) -> Self {
        match node {
            FilterNode::Group { op, filters } => json!({
                "op": op.as_str(),
                "filters": filters.into_iter().map(Json::from).collect::<Vec<_>>(),
            }),
            FilterNode::Leaf { key, op, value } => json!({
                "key": {"section": key.section.as_str(), "name": key.name},
                "op": op.as_str(),
                "value": serde_json::to_value(&value).unwrap_or(Json::Null),
            }),
            FilterNode::Invalid(json) => json,
        }
    }
}
