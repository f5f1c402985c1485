//! Request/Response types for the query pipeline

use crate::config::EngineConfig;
use runboard_core::{FilterNode, Run};
use runboard_runtime::grouping::{expand_group_filter, expand_subgroup_filter};
use runboard_runtime::selection;
use runboard_runtime::{AxisOption, ColumnsConfig, Grouping, KeySuggestion, Level, RunRow, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Row limit of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub size: usize,
}

/// What the client wants to see of the run set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    /// Runs to show
    pub filters: FilterNode,

    /// Runs highlighted by range brushing, evaluated over the filtered runs
    pub selections: FilterNode,

    pub sort: SortSpec,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<Grouping>,

    pub level: Level,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,

    /// Answer with an empty response without touching the run set
    pub disabled: bool,

    /// The base dataset is unchanged since the last request
    pub reuse_base: bool,

    pub columns: ColumnsConfig,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filters: FilterNode::and(Vec::new()),
            selections: selection::none(),
            sort: SortSpec::default(),
            grouping: None,
            level: Level::Run,
            page: None,
            disabled: false,
            reuse_base: false,
            columns: ColumnsConfig::default(),
        }
    }
}

impl Query {
    pub fn new(filters: FilterNode) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn with_selections(mut self, selections: FilterNode) -> Self {
        self.selections = selections;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Group the rows; the level becomes `group`
    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = Some(grouping);
        self.level = Level::Group;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page = Some(Page { size });
        self
    }

    pub fn reusing_base(mut self) -> Self {
        self.reuse_base = true;
        self
    }

    /// A query whose response is empty
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Default::default()
        }
    }

    /// Expanded phase of the group `run` belongs to: its subgroups when a
    /// subgroup key is set, otherwise its runs. Returns `None` for an
    /// ungrouped query.
    pub fn expand_group(&self, run: &Run, config: &EngineConfig) -> Option<Query> {
        let grouping = self.grouping.as_ref()?;
        let (level, size) = if grouping.subgroup.is_some() {
            (Level::Subgroup, config.subgroup_page_size)
        } else {
            (Level::Run, config.run_page_size)
        };
        Some(Query {
            filters: expand_group_filter(&self.filters, grouping, run),
            level,
            page: Some(Page { size }),
            reuse_base: true,
            ..self.clone()
        })
    }

    /// Expanded phase of the subgroup `run` belongs to. Returns `None` unless
    /// the query has a subgroup key.
    pub fn expand_subgroup(&self, run: &Run, config: &EngineConfig) -> Option<Query> {
        let grouping = self.grouping.as_ref()?;
        grouping.subgroup.as_ref()?;
        Some(Query {
            filters: expand_subgroup_filter(&self.filters, grouping, run),
            level: Level::Run,
            page: Some(Page {
                size: config.run_page_size,
            }),
            reuse_base: true,
            ..self.clone()
        })
    }
}

/// One message to the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunsRequest {
    /// Run set to merge into instead of the pipeline's own
    pub base_runs: Option<Vec<Run>>,

    /// Raw payloads of the previous message
    pub previous_raw_batch: Vec<Json>,

    /// Raw payloads of this message
    pub raw_batch: Vec<Json>,

    /// Required; a request without one is rejected
    pub query: Option<Query>,
}

impl RunsRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query: Some(query),
            ..Default::default()
        }
    }

    pub fn with_raw_batch(mut self, raw_batch: Vec<Json>) -> Self {
        self.raw_batch = raw_batch;
        self
    }

    pub fn with_previous_raw_batch(mut self, previous: Vec<Json>) -> Self {
        self.previous_raw_batch = previous;
        self
    }

    pub fn with_base_runs(mut self, runs: Vec<Run>) -> Self {
        self.base_runs = Some(runs);
        self
    }
}

/// Snapshot answering one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsResponse {
    /// Whole run set after the merge
    pub base: Vec<Run>,

    /// Runs passing the query filters, sorted
    pub filtered: Vec<Run>,

    /// Filtered runs keyed by name
    pub filtered_runs_by_id: BTreeMap<String, Run>,

    /// Filtered runs inside the selection, sorted
    pub selected_runs: Vec<Run>,

    /// Selected run names mapped to run ids
    pub selected_runs_by_id: BTreeMap<String, String>,

    pub keys: Vec<KeySuggestion>,

    pub axis_options: Vec<AxisOption>,

    pub column_names: Vec<String>,

    /// Display rows for the requested level, truncated to the page size
    pub rows: Vec<RunRow>,

    /// Row count before truncation
    pub total_rows: usize,
}
