//! Configuration types for the query pipeline

use crate::error::{Result, SdkError};
use runboard_runtime::AutoColumnOptions;
use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distinct values a config key needs to get an automatic column
    pub config_min_unique: usize,

    /// Distinct values a summary key needs to get an automatic column
    pub summary_min_unique: usize,

    /// Cap on automatic columns per section
    pub max_auto_columns: Option<usize>,

    /// Row limit applied when a query does not set a page size
    pub default_page_size: Option<usize>,

    /// Page size of an expansion that lists runs
    pub run_page_size: usize,

    /// Page size of a group expanded into its subgroups
    pub subgroup_page_size: usize,

    /// Name of the worker thread
    pub worker_thread_name: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            config_min_unique: 2,
            summary_min_unique: 1,
            max_auto_columns: None,
            default_page_size: None,
            run_page_size: 1000,
            subgroup_page_size: 500,
            worker_thread_name: "runboard-worker".to_string(),
        }
    }

    /// Set the automatic column thresholds
    pub fn with_min_unique(mut self, config: usize, summary: usize) -> Self {
        self.config_min_unique = config;
        self.summary_min_unique = summary;
        self
    }

    /// Cap automatic columns per section
    pub fn with_max_auto_columns(mut self, max: usize) -> Self {
        self.max_auto_columns = Some(max);
        self
    }

    /// Set the default page size
    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    /// Set the page sizes of expansions listing runs and subgroups
    pub fn with_expanded_page_sizes(mut self, runs: usize, subgroup: usize) -> Self {
        self.run_page_size = runs;
        self.subgroup_page_size = subgroup;
        self
    }

    /// Set the worker thread name
    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }

    /// Thresholds handed to column selection
    pub fn auto_column_options(&self) -> AutoColumnOptions {
        AutoColumnOptions {
            config_min_unique: self.config_min_unique,
            summary_min_unique: self.summary_min_unique,
            max_auto_columns: self.max_auto_columns,
        }
    }

    /// Reject settings the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.run_page_size == 0 || self.subgroup_page_size == 0 {
            return Err(SdkError::Config(
                "expanded page sizes must be positive".to_string(),
            ));
        }
        if self.default_page_size == Some(0) {
            return Err(SdkError::Config(
                "default page size must be positive".to_string(),
            ));
        }
        if self.worker_thread_name.trim().is_empty() {
            return Err(SdkError::Config(
                "worker thread name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
