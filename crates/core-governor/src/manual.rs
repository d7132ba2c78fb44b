//! Virtual-clock scheduler
//!
//! Time only moves when the owner calls [`ManualScheduler::advance`]. Due
//! tasks run in deadline order (ties in scheduling order), with the clock set
//! to each task's deadline while it runs. Used for deterministic timelines in
//! tests and in the replay simulator.

use crate::scheduler::{Scheduler, Task, TimerHandle};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct ManualState {
    origin: Instant,
    elapsed: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), Task>,
}

/// Deterministic scheduler driven by explicit time advances
///
/// Clones share one clock and one timer queue.
///
/// # Example
/// ```
/// use quench_core_governor::{ManualScheduler, Scheduler};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = ManualScheduler::new();
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = fired.clone();
/// let _timer = clock.schedule(
///     Duration::from_millis(100),
///     Box::new(move || flag.store(true, Ordering::SeqCst)),
/// );
///
/// clock.advance(Duration::from_millis(99));
/// assert!(!fired.load(Ordering::SeqCst));
/// clock.advance(Duration::from_millis(1));
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Clone)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualState>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    /// Create a scheduler whose clock starts at zero elapsed time
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                next_seq: 0,
                queue: BTreeMap::new(),
            })),
        }
    }

    /// Virtual time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().elapsed
    }

    /// Number of tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Elapsed-time deadline of the next task, if any
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.lock().queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move the clock forward by `by`, running every task that falls due
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.elapsed() + by;
        self.advance_to(target)
    }

    /// Move the clock to `target` (no-op if already past it), running due tasks
    ///
    /// Tasks scheduled by a running task are run too if they fall due before
    /// `target`. Returns the number of tasks run.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        while let Some(task) = self.pop_due(target) {
            // The queue lock is released here so tasks can schedule or cancel
            task();
            fired += 1;
        }
        fired
    }

    /// Advance until no tasks remain; returns the number of tasks run
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            fired += self.advance_to(deadline);
        }
        fired
    }

    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.inner.lock();
        let next = state.queue.keys().next().copied();
        match next {
            Some(key) if key.0 <= target => {
                state.elapsed = state.elapsed.max(key.0);
                state.queue.remove(&key)
            }
            _ => {
                state.elapsed = state.elapsed.max(target);
                None
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        let state = self.inner.lock();
        state.origin + state.elapsed
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let key = {
            let mut state = self.inner.lock();
            let key = (state.elapsed + delay, state.next_seq);
            state.next_seq += 1;
            state.queue.insert(key, task);
            key
        };

        let weak = Arc::downgrade(&self.inner);
        TimerHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                // Dropping the task outside the lock keeps its captures from
                // re-entering the scheduler while it is held
                let task = inner.lock().queue.remove(&key);
                drop(task);
            }
        })
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ManualScheduler")
            .field("elapsed", &state.elapsed)
            .field("pending", &state.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    fn recorder() -> (Arc<PlMutex<Vec<(u64, &'static str)>>>, ManualScheduler) {
        (Arc::new(PlMutex::new(Vec::new())), ManualScheduler::new())
    }

    fn push(
        clock: &ManualScheduler,
        log: &Arc<PlMutex<Vec<(u64, &'static str)>>>,
        delay_ms: u64,
        label: &'static str,
    ) -> TimerHandle {
        let log = log.clone();
        let observer = clock.clone();
        clock.schedule(
            Duration::from_millis(delay_ms),
            Box::new(move || {
                log.lock()
                    .push((observer.elapsed().as_millis() as u64, label));
            }),
        )
    }

    #[test]
    fn test_runs_in_deadline_order() {
        let (log, clock) = recorder();
        let _a = push(&clock, &log, 30, "a");
        let _b = push(&clock, &log, 10, "b");
        let _c = push(&clock, &log, 10, "c");

        assert_eq!(clock.advance(Duration::from_millis(50)), 3);
        assert_eq!(*log.lock(), vec![(10, "b"), (10, "c"), (30, "a")]);
        assert_eq!(clock.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn test_cancel_removes_task() {
        let (log, clock) = recorder();
        let handle = push(&clock, &log, 10, "cancelled");
        assert_eq!(clock.pending(), 1);
        handle.cancel();
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.advance(Duration::from_millis(20)), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_nested_schedule_runs_within_advance() {
        let clock = ManualScheduler::new();
        let hits = Arc::new(PlMutex::new(Vec::new()));

        let inner_clock = clock.clone();
        let inner_hits = hits.clone();
        let _outer = clock.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let at = inner_clock.elapsed();
                inner_hits.lock().push(at);
                let hits = inner_hits.clone();
                let clock = inner_clock.clone();
                inner_clock
                    .schedule(
                        Duration::from_millis(5),
                        Box::new(move || hits.lock().push(clock.elapsed())),
                    )
                    .detach();
            }),
        );

        assert_eq!(clock.advance(Duration::from_millis(20)), 2);
        assert_eq!(
            *hits.lock(),
            vec![Duration::from_millis(10), Duration::from_millis(15)]
        );
    }

    #[test]
    fn test_run_until_idle_and_now() {
        let (log, clock) = recorder();
        let start = clock.now();
        let _a = push(&clock, &log, 250, "late");
        assert_eq!(clock.next_deadline(), Some(Duration::from_millis(250)));
        assert_eq!(clock.run_until_idle(), 1);
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }

    #[test]
    fn test_advance_to_past_is_noop() {
        let clock = ManualScheduler::new();
        clock.advance(Duration::from_millis(100));
        clock.advance_to(Duration::from_millis(40));
        assert_eq!(clock.elapsed(), Duration::from_millis(100));
    }
}
