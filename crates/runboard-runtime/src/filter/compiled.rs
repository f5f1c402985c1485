//! Compiled filter trees

use super::comparison::compare;
use crate::error::{Result, RuntimeError};
use regex::Regex;
use runboard_core::{FilterNode, FilterOperator, GroupOperator, Run, RunKey, Value};

/// A filter tree ready for repeated evaluation
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    root: Node,
}

#[derive(Debug, Clone)]
enum Node {
    All(Vec<Node>),
    Any(Vec<Node>),
    Compare {
        key: RunKey,
        op: FilterOperator,
        literal: Value,
    },
    Pattern {
        key: RunKey,
        regex: Regex,
    },
    Never,
}

impl CompiledFilter {
    /// Compile a filter tree. Never fails: invalid patterns, unknown sections
    /// and unrecognized nodes compile to leaves that never match.
    pub fn compile(filter: &FilterNode) -> Self {
        Self {
            root: compile_node(filter, false).unwrap_or(Node::Never),
        }
    }

    /// Compile a filter tree, rejecting invalid patterns and unrecognized
    /// nodes instead of absorbing them.
    pub fn try_compile(filter: &FilterNode) -> Result<Self> {
        Ok(Self {
            root: compile_node(filter, true)?,
        })
    }

    /// A filter that matches every run
    pub fn match_all() -> Self {
        Self {
            root: Node::All(Vec::new()),
        }
    }

    /// Evaluate against one run
    pub fn matches(&self, run: &Run) -> bool {
        self.root.matches(run)
    }

    /// Runs matching this filter, in input order
    pub fn filter_runs(&self, runs: &[Run]) -> Vec<Run> {
        runs.iter().filter(|run| self.matches(run)).cloned().collect()
    }
}

fn compile_node(filter: &FilterNode, strict: bool) -> Result<Node> {
    match filter {
        FilterNode::Group { op, filters } => {
            let children = filters
                .iter()
                .map(|child| compile_node(child, strict))
                .collect::<Result<Vec<_>>>()?;
            Ok(match op {
                GroupOperator::And => Node::All(children),
                GroupOperator::Or => Node::Any(children),
            })
        }
        FilterNode::Leaf { key, op, value } => {
            if !key.section.is_known() {
                tracing::debug!("Filter on unknown section {}, never matches", key.section);
                return Ok(Node::Never);
            }
            if *op == FilterOperator::Regex {
                return compile_pattern(key, value, strict);
            }
            Ok(Node::Compare {
                key: key.clone(),
                op: *op,
                literal: value.clone(),
            })
        }
        FilterNode::Invalid(json) => {
            if strict {
                return Err(RuntimeError::InvalidFilterShape(json.to_string()));
            }
            tracing::warn!("Invalid filter shape treated as never matching: {}", json);
            Ok(Node::Never)
        }
    }
}

fn compile_pattern(key: &RunKey, pattern: &Value, strict: bool) -> Result<Node> {
    if pattern.is_null() {
        return Ok(Node::Never);
    }
    let pattern = pattern.to_string();
    match Regex::new(&pattern) {
        Ok(regex) => Ok(Node::Pattern {
            key: key.clone(),
            regex,
        }),
        Err(source) if strict => Err(RuntimeError::InvalidPattern { pattern, source }),
        Err(e) => {
            tracing::warn!("Invalid pattern {:?} treated as never matching: {}", pattern, e);
            Ok(Node::Never)
        }
    }
}

impl Node {
    fn matches(&self, run: &Run) -> bool {
        match self {
            Node::All(children) => children.iter().all(|child| child.matches(run)),
            Node::Any(children) => children.iter().any(|child| child.matches(run)),
            Node::Compare { key, op, literal } => {
                let field = run.get_value(key);
                compare(field.as_ref(), *op, literal)
            }
            Node::Pattern { key, regex } => match run.get_value(key) {
                Some(field) if !field.is_null() => regex.is_match(&field.to_string()),
                _ => false,
            },
            Node::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run() -> Run {
        Run::from_payload(&json!({
            "name": "resnet-50",
            "state": "finished",
            "tags": ["baseline"],
            "config": r#"{"lr": {"value": 0.01}, "optimizer": {"value": "adam"}}"#,
            "summaryMetrics": r#"{"acc": 0.91}"#
        }))
        .unwrap()
    }

    fn always_true() -> FilterNode {
        FilterNode::leaf(RunKey::run("name"), FilterOperator::Eq, "resnet-50")
    }

    fn always_false() -> FilterNode {
        FilterNode::leaf(RunKey::run("name"), FilterOperator::Eq, "vgg")
    }

    #[test]
    fn test_and_or_semantics() {
        let run = run();
        assert!(!CompiledFilter::compile(&FilterNode::and(vec![always_true(), always_false()]))
            .matches(&run));
        assert!(CompiledFilter::compile(&FilterNode::or(vec![always_false(), always_true()]))
            .matches(&run));
        assert!(CompiledFilter::compile(&FilterNode::and(vec![])).matches(&run));
        assert!(!CompiledFilter::compile(&FilterNode::or(vec![])).matches(&run));
    }

    #[test]
    fn test_regex_match() {
        let run = run();
        let filter = FilterNode::leaf(RunKey::run("name"), FilterOperator::Regex, "^resnet-\\d+$");
        assert!(CompiledFilter::compile(&filter).matches(&run));

        let filter = FilterNode::leaf(RunKey::config("lr"), FilterOperator::Regex, "^0\\.01$");
        assert!(CompiledFilter::compile(&filter).matches(&run));
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let filter = FilterNode::leaf(RunKey::run("name"), FilterOperator::Regex, "(");
        assert!(!CompiledFilter::compile(&filter).matches(&run()));
        assert!(matches!(
            CompiledFilter::try_compile(&filter),
            Err(RuntimeError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_shape() {
        let filter = FilterNode::and(vec![FilterNode::from(json!({"op": "NAND"}))]);
        assert!(!CompiledFilter::compile(&filter).matches(&run()));
        assert!(matches!(
            CompiledFilter::try_compile(&filter),
            Err(RuntimeError::InvalidFilterShape(_))
        ));
    }

    #[test]
    fn test_tag_membership() {
        let hidden = FilterNode::default_run_filter();
        assert!(CompiledFilter::compile(&hidden).matches(&run()));

        let baseline = FilterNode::leaf(RunKey::tag("baseline"), FilterOperator::Eq, true);
        assert!(CompiledFilter::compile(&baseline).matches(&run()));
    }

    #[test]
    fn test_filter_runs_preserves_order() {
        let runs: Vec<Run> = ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Run::from_payload(&json!({
                    "name": name,
                    "summaryMetrics": format!(r#"{{"step": {}}}"#, i)
                }))
                .unwrap()
            })
            .collect();
        let filter = FilterNode::leaf(RunKey::summary("step"), FilterOperator::Ne, 1.0);
        let names: Vec<_> = CompiledFilter::compile(&filter)
            .filter_runs(&runs)
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "c", "d"]);
    }
}
