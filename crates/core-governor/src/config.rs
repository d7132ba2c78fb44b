//! Governor configuration

use crate::error::{GovernorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the governor limits invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GovernorMode {
    /// Coalesce a burst and fire once after a quiet period
    #[default]
    Debounce,

    /// Fire at most once per interval, as early as permitted
    Throttle,
}

impl std::fmt::Display for GovernorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GovernorMode::Debounce => write!(f, "debounce"),
            GovernorMode::Throttle => write!(f, "throttle"),
        }
    }
}

/// Configuration for a [`Governor`](crate::Governor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Debounce or throttle
    #[serde(default)]
    pub mode: GovernorMode,

    /// Quiet period (debounce) or minimum spacing (throttle)
    #[serde(
        rename = "interval_ms",
        with = "duration_ms",
        default = "default_interval"
    )]
    pub interval: Duration,

    /// Debounce only: also fire on the first trigger of a burst
    #[serde(default)]
    pub immediate: bool,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            mode: GovernorMode::default(),
            interval: default_interval(),
            immediate: false,
        }
    }
}

impl GovernorConfig {
    /// Debounce with the given quiet period
    pub fn debounce(interval: Duration) -> Self {
        Self {
            mode: GovernorMode::Debounce,
            interval,
            immediate: false,
        }
    }

    /// Throttle with the given minimum spacing
    pub fn throttle(interval: Duration) -> Self {
        Self {
            mode: GovernorMode::Throttle,
            interval,
            immediate: false,
        }
    }

    /// Fire on the leading edge of a burst (debounce only)
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Reject option combinations the mode does not support
    pub fn validate(&self) -> Result<()> {
        if self.immediate && self.mode == GovernorMode::Throttle {
            return Err(GovernorError::invalid_config(
                "immediate applies to debounce only; throttle always fires on the leading edge",
            ));
        }
        Ok(())
    }
}

fn default_interval() -> Duration {
    Duration::from_millis(100)
}

/// Serialize a `Duration` as whole milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
