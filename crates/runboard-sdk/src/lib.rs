//! Runboard SDK
//!
//! High-level API for querying a run set: the [`RunsPipeline`] that sequences
//! one query pass, and the [`RunsWorker`] that runs it off the caller's thread.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod worker;

// Re-export main types
pub use config::EngineConfig;
pub use error::{Result, SdkError};
pub use pipeline::{Page, Query, RunsPipeline, RunsRequest, RunsResponse};
pub use worker::{LatestResponse, RunsClient, RunsWorker, TaggedResponse};

// Re-export commonly used types from dependencies
pub use runboard_core::{FilterNode, FilterOperator, Run, RunKey, Value};
pub use runboard_runtime::{Grouping, Level, SortSpec};
