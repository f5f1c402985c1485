//! Runboard CLI
//!
//! Configuration, file loading and condition parsing for the `runboard`
//! binary.

pub mod condition;
pub mod config;
pub mod input;

pub use config::{LogFormat, RunboardConfig};
