//! Runboard Runtime - Query operators over run sets
//!
//! This crate provides the stateless building blocks the pipeline sequences
//! for every query: merging raw payloads into a run set, filter evaluation,
//! range selections, sorting, grouping and key discovery.

pub mod error;
pub mod filter;
pub mod grouping;
pub mod keys;
pub mod merge;
pub mod selection;
pub mod sort;

// Re-export main types
pub use error::{Result, RuntimeError};
pub use filter::CompiledFilter;
pub use grouping::{Grouping, Level, RunGroup, RunRow};
pub use keys::{AutoColumnOptions, AxisOption, ColumnConfig, ColumnsConfig, KeySuggestion};
pub use merge::{merge_runs, MergeStats};
pub use selection::{Bounds, SelectionBounds};
pub use sort::SortSpec;
