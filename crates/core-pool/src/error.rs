//! Error types for pool operations

use crate::pool::ObjectId;
use std::fmt;
use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Why a handle was refused by [`Pool::release`](crate::Pool::release)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseFault {
    /// The handle was acquired from a different pool
    ForeignPool,
    /// The slot is not currently marked in-use
    ///
    /// Handles are move-only and cannot be built outside this crate, so the
    /// public API never produces this. It guards the pool's own bookkeeping.
    NotInUse,
}

impl fmt::Display for ReleaseFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseFault::ForeignPool => write!(f, "handle belongs to another pool"),
            ReleaseFault::NotInUse => write!(f, "object is not in use"),
        }
    }
}

/// Errors that can occur during pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Every object the pool may construct is currently in use
    #[error("Pool exhausted: all {capacity} objects are in use")]
    PoolExhausted { capacity: usize },

    /// The released handle is not tracked as in-use by this pool
    #[error("Invalid release of {id}: {reason}")]
    InvalidRelease { id: ObjectId, reason: ReleaseFault },

    /// Pool configuration rejected at construction
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
}

impl PoolError {
    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(reason: S) -> Self {
        PoolError::InvalidConfig(reason.into())
    }

    /// Check if the caller can reasonably retry the operation later
    ///
    /// Exhaustion clears once another holder releases an object. Invalid
    /// releases and bad configuration are caller bugs.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PoolError::PoolExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(PoolError::PoolExhausted { capacity: 4 }.is_recoverable());
        assert!(!PoolError::invalid_config("capacity must be > 0").is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = PoolError::PoolExhausted { capacity: 2 };
        assert_eq!(err.to_string(), "Pool exhausted: all 2 objects are in use");

        let err = PoolError::invalid_config("prewarm exceeds capacity");
        assert!(err.to_string().contains("prewarm exceeds capacity"));
    }
}
