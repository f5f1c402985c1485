//! Core RunsPipeline implementation

use super::types::{RunsRequest, RunsResponse};
use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use runboard_core::Run;
use runboard_runtime::grouping::group_rows;
use runboard_runtime::keys::{axis_options, column_names, key_suggestions};
use runboard_runtime::sort::sort_runs;
use runboard_runtime::{merge_runs, CompiledFilter};
use std::collections::{BTreeMap, HashSet};

/// Owns one dataset's run set and answers queries against it.
///
/// Every request runs `merge -> filter -> select -> sort -> keys -> rows`.
/// Only the merge can be skipped (`reuseBase`); the rest is recomputed so the
/// response always reflects the current query. The run set is never handed
/// out by reference: responses carry copies.
pub struct RunsPipeline {
    config: EngineConfig,
    runs: Vec<Run>,
}

impl RunsPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            runs: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current run set
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Process one request
    pub fn handle(&mut self, request: RunsRequest) -> Result<RunsResponse> {
        let RunsRequest {
            base_runs,
            previous_raw_batch,
            raw_batch,
            query,
        } = request;
        let query = query.ok_or(SdkError::MissingQuery)?;

        if query.disabled {
            tracing::debug!("Query disabled, returning empty response");
            return Ok(RunsResponse::default());
        }

        // Merge
        if query.reuse_base {
            if let Some(base) = base_runs {
                self.runs = base;
            }
            tracing::debug!("Reusing base run set ({} runs)", self.runs.len());
        } else {
            let base = base_runs.as_deref().unwrap_or(&self.runs);
            let (runs, _) = merge_runs(base, &previous_raw_batch, &raw_batch);
            self.runs = runs;
        }

        // Filter and select
        let filtered = CompiledFilter::compile(&query.filters).filter_runs(&self.runs);
        let selection = CompiledFilter::compile(&query.selections);
        let selected_ids: HashSet<String> = filtered
            .iter()
            .filter(|run| selection.matches(run))
            .map(|run| run.id().to_string())
            .collect();

        // Sort
        let filtered = sort_runs(&query.sort, filtered, &selected_ids);
        let selected_runs: Vec<Run> = filtered
            .iter()
            .filter(|run| selected_ids.contains(run.id()))
            .cloned()
            .collect();

        // Keys and columns
        let keys = key_suggestions(&self.runs);
        let axis_options = axis_options(&keys);
        let column_names = column_names(
            &filtered,
            query.grouping.as_ref(),
            &query.columns,
            &self.config.auto_column_options(),
        );

        // Rows
        let mut rows = group_rows(&filtered, query.grouping.as_ref(), query.level);
        let total_rows = rows.len();
        if let Some(size) = query.page.map(|p| p.size).or(self.config.default_page_size) {
            rows.truncate(size);
        }

        tracing::debug!(
            base = self.runs.len(),
            filtered = filtered.len(),
            selected = selected_runs.len(),
            rows = rows.len(),
            total_rows,
            "Query processed"
        );

        Ok(RunsResponse {
            base: self.runs.clone(),
            filtered_runs_by_id: filtered
                .iter()
                .map(|run| (run.name().to_string(), run.clone()))
                .collect(),
            selected_runs_by_id: selected_runs
                .iter()
                .map(|run| (run.name().to_string(), run.id().to_string()))
                .collect::<BTreeMap<_, _>>(),
            filtered,
            selected_runs,
            keys,
            axis_options,
            column_names,
            rows,
            total_rows,
        })
    }
}
