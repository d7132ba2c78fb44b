/*!
 * Error types for Quench
 */

use quench_core_governor::GovernorError;
use quench_core_pool::PoolError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuenchError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_RUNTIME: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Error, Debug)]
pub enum QuenchError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file could not be read or parsed
    #[error("Failed to load config {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed command-line or script input
    #[error("Invalid input: {0}")]
    Parse(String),

    /// Pool operation failed
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Governor construction failed
    #[error(transparent)]
    Governor(#[from] GovernorError),

    /// Output serialization failed
    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl QuenchError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            QuenchError::ConfigFile { .. }
            | QuenchError::Config(_)
            | QuenchError::Parse(_)
            | QuenchError::Pool(PoolError::InvalidConfig(_))
            | QuenchError::Governor(_) => EXIT_FATAL,
            _ => EXIT_RUNTIME,
        }
    }
}

impl From<serde_json::Error> for QuenchError {
    fn from(e: serde_json::Error) -> Self {
        QuenchError::Serialize(e.to_string())
    }
}

impl From<toml::ser::Error> for QuenchError {
    fn from(e: toml::ser::Error) -> Self {
        QuenchError::Serialize(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(QuenchError::Config("bad".into()).exit_code(), EXIT_FATAL);
        assert_eq!(QuenchError::Parse("x".into()).exit_code(), EXIT_FATAL);
        assert_eq!(
            QuenchError::from(GovernorError::NoRuntime).exit_code(),
            EXIT_FATAL
        );
        assert_eq!(
            QuenchError::from(PoolError::PoolExhausted { capacity: 1 }).exit_code(),
            EXIT_RUNTIME
        );
        assert_eq!(
            QuenchError::from(io::Error::other("disk")).exit_code(),
            EXIT_RUNTIME
        );
    }

    #[test]
    fn test_transparent_messages() {
        let err = QuenchError::from(PoolError::PoolExhausted { capacity: 3 });
        assert_eq!(err.to_string(), "Pool exhausted: all 3 objects are in use");
    }
}
