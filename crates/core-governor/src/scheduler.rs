//! Timer service abstraction
//!
//! The governor only needs one thing from its host: "run this callback after
//! at least `delay`, unless it is cancelled first". [`Scheduler`] captures
//! that contract, and [`TimerHandle`] is the exclusively owned, cancellable
//! ticket for one scheduled callback.

use crate::error::{GovernorError, Result};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// A deferred callback
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Delayed, cancellable callback execution
pub trait Scheduler: Send + Sync + 'static {
    /// Current time as seen by this scheduler
    fn now(&self) -> Instant;

    /// Run `task` once, no earlier than `delay` from now
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Owned handle to one scheduled task
///
/// Dropping the handle cancels the task. Cancelling a task that already ran
/// is a no-op.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    /// Create a handle that runs `cancel` when the timer is cancelled or dropped
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancel the scheduled task
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Give up ownership without cancelling (used once the task has fired)
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Scheduler backed by tokio timers
///
/// Each scheduled task is a spawned `sleep` future; cancellation aborts it.
/// Honors tokio's paused clock, so tests can drive time with
/// `tokio::time::advance`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Schedule onto the given runtime
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Schedule onto the runtime the caller is running in
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| GovernorError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TimerHandle::new(move || join.abort())
    }
}
