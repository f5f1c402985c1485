//! Error types for Runboard Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid filter path: {0:?}")]
    InvalidFilterPath(Vec<usize>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
