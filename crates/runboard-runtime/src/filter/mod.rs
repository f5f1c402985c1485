//! Filter evaluation
//!
//! Filter trees are compiled once per query into a [`CompiledFilter`] and then
//! evaluated against every run. Evaluation is pure: the same `(filter, run)`
//! pair always yields the same answer, and compiled filters can be shared
//! across threads.
//!
//! Evaluation rules:
//! - `AND` with no children matches everything, `OR` with no children nothing
//! - a missing field or a `null` literal only satisfies `=` (both null) and
//!   `!=` (not both null)
//! - `<`, `<=`, `>`, `>=` coerce both sides to numbers and fail closed
//! - `=~` matches the pattern against the stringified field
//! - unknown sections and unrecognized nodes never match

mod comparison;
mod compiled;

pub use comparison::{compare, values_equal};
pub use compiled::CompiledFilter;

use runboard_core::{FilterNode, Run};

/// Evaluate a filter tree against one run
pub fn matches(filter: &FilterNode, run: &Run) -> bool {
    CompiledFilter::compile(filter).matches(run)
}

/// Runs matching `filter`, in input order
pub fn filter_runs(filter: &FilterNode, runs: &[Run]) -> Vec<Run> {
    CompiledFilter::compile(filter).filter_runs(runs)
}
