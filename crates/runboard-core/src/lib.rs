//! Runboard Core - Core types and definitions for the Runboard query engine
//!
//! This crate provides the fundamental types used across the Runboard crates:
//! - Value types for run data
//! - The canonical `Run` record and its normalizer
//! - Field keys (`section:name`) used to address run data
//! - Filter trees shared by filtering, selection and grouping
//! - Error types

pub mod error;
pub mod filter;
pub mod jsonnan;
pub mod key;
pub mod normalize;
pub mod run;
pub mod value;

// Re-export commonly used types
pub use error::CoreError;
pub use filter::{FilterNode, FilterOperator, GroupOperator};
pub use key::{RunKey, Section};
pub use run::{Run, RunState, RunUser};
pub use value::Value;
