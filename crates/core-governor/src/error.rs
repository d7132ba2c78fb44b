//! Error types for governor construction

use thiserror::Error;

/// Result type for governor operations
pub type Result<T> = std::result::Result<T, GovernorError>;

/// Errors that can occur while building a governor or its scheduler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernorError {
    /// Governor configuration rejected
    #[error("Invalid governor configuration: {0}")]
    InvalidConfig(String),

    /// A tokio scheduler was requested outside of a runtime
    #[error("No tokio runtime available for the timer service")]
    NoRuntime,
}

impl GovernorError {
    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(reason: S) -> Self {
        GovernorError::InvalidConfig(reason.into())
    }
}
