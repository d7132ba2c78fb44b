/*!
 * Configuration types for Quench
 */

use crate::error::{QuenchError, Result};
use quench_core_governor::GovernorConfig;
use quench_core_pool::PoolConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuenchConfig {
    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// Object pool sizing
    #[serde(default)]
    pub pool: PoolConfig,

    /// Invocation governor behavior
    #[serde(default)]
    pub governor: GovernorConfig,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    #[default]
    Warn,

    /// Info, warnings, and errors
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl QuenchConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| QuenchError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: QuenchConfig =
            toml::from_str(&contents).map_err(|e| QuenchError::ConfigFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the pool and governor sections
    pub fn validate(&self) -> Result<()> {
        self.pool
            .validate()
            .map_err(|e| QuenchError::Config(e.to_string()))?;
        self.governor
            .validate()
            .map_err(|e| QuenchError::Config(e.to_string()))?;
        Ok(())
    }

    /// Keystroke-driven work such as search-as-you-type or autosave
    pub fn ui_input_preset() -> Self {
        Self {
            governor: GovernorConfig::debounce(Duration::from_millis(250)),
            pool: PoolConfig::bounded(8),
            ..Default::default()
        }
    }

    /// High-frequency event streams (scroll, resize, telemetry ticks)
    pub fn burst_preset() -> Self {
        Self {
            governor: GovernorConfig::throttle(Duration::from_millis(100)),
            pool: PoolConfig::bounded(64).with_prewarm(16),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quench_core_governor::GovernorMode;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = QuenchConfig::default();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.pool.capacity, None);
        assert_eq!(config.governor.mode, GovernorMode::Debounce);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        let ui = QuenchConfig::ui_input_preset();
        assert_eq!(ui.governor.interval, Duration::from_millis(250));
        assert!(ui.validate().is_ok());

        let burst = QuenchConfig::burst_preset();
        assert_eq!(burst.governor.mode, GovernorMode::Throttle);
        assert_eq!(burst.pool.prewarm, 16);
        assert!(burst.validate().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let config = QuenchConfig::burst_preset();
        config.to_file(file.path()).unwrap();

        let loaded = QuenchConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml_str = r#"
log_level = "debug"

[governor]
mode = "throttle"
interval_ms = 40

[pool]
capacity = 4
"#;
        let config: QuenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.governor.interval, Duration::from_millis(40));
        assert!(!config.governor.immediate);
        assert_eq!(config.pool.capacity, Some(4));
        assert_eq!(config.pool.prewarm, 0);
        assert!(!config.verbose);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "[governor]\nmode = \"throttle\"\nimmediate = true\n",
        )
        .unwrap();

        let err = QuenchConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, QuenchError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = QuenchConfig::from_file(Path::new("/nonexistent/quench.toml")).unwrap_err();
        assert!(matches!(err, QuenchError::ConfigFile { .. }));
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
