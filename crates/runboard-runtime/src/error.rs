//! Runtime error types

use thiserror::Error;

/// Runtime error
///
/// Query evaluation itself never fails on dirty data; these errors are only
/// returned by the strict APIs that validate input up front.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A `=~` filter whose pattern does not compile
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A filter node whose shape was not recognized
    #[error("Invalid filter shape: {0}")]
    InvalidFilterShape(String),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
