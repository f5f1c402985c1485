//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// A request arrived without a query
    #[error("Request is missing a query")]
    MissingQuery,

    /// The worker thread is gone
    #[error("Worker is closed")]
    WorkerClosed,

    /// The worker thread panicked
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_query() {
        assert_eq!(SdkError::MissingQuery.to_string(), "Request is missing a query");
    }

    #[test]
    fn test_config_error() {
        let error = SdkError::Config("page size must be positive".to_string());
        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("page size"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let sdk_error: SdkError = err.into();
        assert!(sdk_error.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let sdk_error: SdkError = io_error.into();
        assert!(sdk_error.to_string().contains("File not found"));
    }
}
