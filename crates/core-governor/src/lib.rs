//! Quench Core Governor: Pure-logic invocation rate limiting
//!
//! # Overview
//!
//! A [`Governor`] wraps an action and decides, for each incoming trigger,
//! whether the action runs now, later, or not at all:
//!
//! - **Debounce**: coalesce a burst and run once, with the last trigger's
//!   arguments, after `interval` of quiet. Optionally also run on the first
//!   trigger of the burst (`immediate`).
//! - **Throttle**: run at most once per `interval`. The first trigger runs
//!   at once; the last trigger seen during a cooldown runs when it ends.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  trigger(args) / cancel()    │  ← caller (event source)
//! └──────────────┬───────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  Governor driver             │  ← one lock, one timer slot
//! │  (generation-fenced timers)  │
//! └───────┬──────────────┬───────┘
//!         │              │
//!         ▼              ▼
//! ┌─────────────────┐ ┌─────────────────────┐
//! │ DebounceMachine │ │ Scheduler           │  ← TokioScheduler / ManualScheduler
//! │ ThrottleMachine │ │ (delayed, cancel-   │
//! │ (pure)          │ │  lable callbacks)   │
//! └─────────────────┘ └─────────────────────┘
//! ```
//!
//! The state machines are pure values: they take events and return a
//! [`Step`] (fire now? what to do with the timer?). The driver applies the
//! step, so the same transitions run identically on a tokio runtime and on
//! the virtual clock of [`ManualScheduler`].
//!
//! # Usage Example
//!
//! ```no_run
//! use quench_core_governor::{Governor, GovernorError, TokioScheduler};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), GovernorError> {
//! let scheduler = TokioScheduler::current()?;
//! let autosave = Governor::throttle(Duration::from_secs(2), scheduler, |doc: String| {
//!     println!("saving {} bytes", doc.len());
//! })?;
//!
//! autosave.trigger("draft v1".to_string());
//! autosave.trigger("draft v2".to_string()); // saved when the window closes
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod governor;
pub mod manual;
pub mod scheduler;
pub mod state;
pub mod throttle;

// Re-export main types for convenience
pub use config::{GovernorConfig, GovernorMode};
pub use debounce::DebounceMachine;
pub use error::{GovernorError, Result};
pub use governor::Governor;
pub use manual::ManualScheduler;
pub use scheduler::{Scheduler, Task, TimerHandle, TokioScheduler};
pub use state::{GovernorState, Step, TimerCommand};
pub use throttle::ThrottleMachine;

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::config::{GovernorConfig, GovernorMode};
    pub use super::error::GovernorError;
    pub use super::governor::Governor;
    pub use super::manual::ManualScheduler;
    pub use super::scheduler::{Scheduler, TokioScheduler};
    pub use super::state::GovernorState;
}
