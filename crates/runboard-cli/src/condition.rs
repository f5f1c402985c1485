//! Command line filter conditions
//!
//! A condition is written `<key><op><value>`, e.g. `config:lr<0.1`,
//! `state=running` or `name=~^resnet`. The value is typed the same way a
//! filter builder types user input.

use anyhow::{Context, Result};
use runboard_core::value::parse_value;
use runboard_core::{FilterNode, FilterOperator, GroupOperator, RunKey, Value};

const ROOT: &[usize] = &[];
const FIRST_CHILD: &[usize] = &[0];

// Two-character operators first so `<=` is not read as `<`
const OPERATORS: &[&str] = &["=~", "!=", "<=", ">=", "=", "<", ">"];

/// Parse one condition into a filter leaf
pub fn parse_condition(text: &str) -> Result<FilterNode> {
    let (index, op) = text
        .char_indices()
        .find_map(|(i, _)| {
            OPERATORS
                .iter()
                .find(|op| text[i..].starts_with(**op))
                .map(|op| (i, *op))
        })
        .with_context(|| format!("No operator in condition {:?}", text))?;

    let key: RunKey = text[..index]
        .trim()
        .parse()
        .with_context(|| format!("Invalid key in condition {:?}", text))?;
    let op = FilterOperator::parse(op).with_context(|| format!("Unknown operator {}", op))?;
    let raw = Value::from(text[index + op.as_str().len()..].trim());
    let value = if op == FilterOperator::Regex {
        raw
    } else {
        parse_value(&raw)
    };
    Ok(FilterNode::leaf(key, op, value))
}

/// Narrow `filters` with `condition`. The condition joins the top-level `AND`
/// group (or the single `AND` inside an `OR`) when there is one.
pub fn add_condition(filters: &FilterNode, condition: FilterNode) -> FilterNode {
    let path: Option<&[usize]> = match filters {
        FilterNode::Group {
            op: GroupOperator::And,
            ..
        } => Some(ROOT),
        FilterNode::Group {
            op: GroupOperator::Or,
            filters: children,
        } if children.len() == 1
            && matches!(
                children[0],
                FilterNode::Group {
                    op: GroupOperator::And,
                    ..
                }
            ) =>
        {
            Some(FIRST_CHILD)
        }
        _ => None,
    };

    match path.map(|path| filters.group_push(path, condition.clone())) {
        Some(Ok(pushed)) => pushed,
        _ => FilterNode::and(vec![filters.clone(), condition]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_condition() {
        assert_eq!(
            parse_condition("config:lr<=0.1").unwrap(),
            FilterNode::leaf(RunKey::config("lr"), FilterOperator::Le, 0.1)
        );
        assert_eq!(
            parse_condition("state = running").unwrap(),
            FilterNode::leaf(RunKey::run("state"), FilterOperator::Eq, "running")
        );
        assert_eq!(
            parse_condition("tags:hidden=false").unwrap(),
            FilterNode::leaf(RunKey::tag("hidden"), FilterOperator::Eq, false)
        );
        assert_eq!(
            parse_condition("name=~^res.*1$").unwrap(),
            FilterNode::leaf(RunKey::run("name"), FilterOperator::Regex, "^res.*1$")
        );
    }

    #[test]
    fn test_parse_condition_errors() {
        assert!(parse_condition("config:lr").is_err());
        assert!(parse_condition("=3").is_err());
    }

    #[test]
    fn test_add_condition() {
        let leaf = FilterNode::leaf(RunKey::run("host"), FilterOperator::Eq, "gpu-1");

        let added = add_condition(&FilterNode::default_run_filter(), leaf.clone());
        assert_eq!(
            added,
            FilterNode::or(vec![FilterNode::and(vec![
                FilterNode::leaf(RunKey::tag("hidden"), FilterOperator::Eq, false),
                leaf.clone(),
            ])])
        );

        let added = add_condition(&FilterNode::and(vec![]), leaf.clone());
        assert_eq!(added, FilterNode::and(vec![leaf.clone()]));

        let either = FilterNode::or(vec![FilterNode::and(vec![]), FilterNode::and(vec![])]);
        let added = add_condition(&either, leaf.clone());
        assert_eq!(added, FilterNode::and(vec![either, leaf]));
    }
}
