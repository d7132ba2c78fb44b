/*!
 * Quench - bounded resource reuse and invocation-rate governing
 *
 * - Object pools with fixed or unbounded capacity and explicit release
 * - Debounce (trailing, optionally leading) and throttle governors
 * - Pluggable timer service: tokio runtime or a deterministic virtual clock
 * - TOML configuration, structured logging and a replay simulator
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod simulate;

// Re-export commonly used types
pub use config::{LogLevel, QuenchConfig};
pub use error::{QuenchError, Result};
pub use quench_core_governor as governor;
pub use quench_core_pool as pool;
pub use simulate::{replay_governor, run_pool_script, GovernorReport, PoolOp, PoolReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
