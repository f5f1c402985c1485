//! RunsPipeline - sequencing of one query pass
//!
//! The module is organized into:
//! - `types`: Request/Response types (Query, RunsRequest, RunsResponse)
//! - `engine`: the RunsPipeline that owns a run set and answers requests

mod engine;
mod types;

pub use engine::RunsPipeline;
pub use types::{Page, Query, RunsRequest, RunsResponse};
