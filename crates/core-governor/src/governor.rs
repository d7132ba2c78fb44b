//! Governor: binds a state machine, a scheduler and an action
//!
//! The driver owns exactly one timer slot. Every transition runs under a
//! per-instance lock and is committed before the action is invoked, and the
//! action itself runs with the lock released. An action that panics therefore
//! leaves the governor in a consistent state, and an action may re-enter the
//! governor that invoked it.

use crate::config::{GovernorConfig, GovernorMode};
use crate::debounce::DebounceMachine;
use crate::error::Result;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::state::{GovernorState, Step, TimerCommand};
use crate::throttle::ThrottleMachine;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

type Action<A> = Box<dyn Fn(A) + Send + Sync + 'static>;

enum Machine<A> {
    Debounce(DebounceMachine<A>),
    Throttle(ThrottleMachine<A>),
}

impl<A> Machine<A> {
    fn on_trigger(&mut self, now: Instant, args: A) -> Step<A> {
        match self {
            Machine::Debounce(m) => m.on_trigger(args),
            Machine::Throttle(m) => m.on_trigger(now, args),
        }
    }

    fn on_expiry(&mut self, now: Instant) -> Step<A> {
        match self {
            Machine::Debounce(m) => m.on_expiry(),
            Machine::Throttle(m) => m.on_expiry(now),
        }
    }

    fn cancel(&mut self) -> bool {
        match self {
            Machine::Debounce(m) => m.cancel(),
            Machine::Throttle(m) => m.cancel(),
        }
    }

    fn is_pending(&self) -> bool {
        match self {
            Machine::Debounce(m) => m.is_pending(),
            Machine::Throttle(m) => m.is_pending(),
        }
    }

    fn state_at(&self, now: Instant) -> GovernorState {
        match self {
            Machine::Debounce(m) => m.state(),
            Machine::Throttle(m) => m.state_at(now),
        }
    }
}

/// The single timer slot plus the machine it serves
struct Slot<A> {
    machine: Machine<A>,
    timer: Option<TimerHandle>,
    /// Bumped on every arm and cancel; expiries carrying an older value are stale
    generation: u64,
}

struct Shared<A> {
    config: GovernorConfig,
    scheduler: Arc<dyn Scheduler>,
    action: Action<A>,
    slot: Mutex<Slot<A>>,
    invocations: AtomicU64,
}

impl<A: Send + 'static> Shared<A> {
    fn apply(self: &Arc<Self>, slot: &mut Slot<A>, command: TimerCommand) {
        match command {
            TimerCommand::Keep => {}
            TimerCommand::Arm(delay) => self.arm(slot, delay),
            TimerCommand::Clear => {
                slot.generation = slot.generation.wrapping_add(1);
                if let Some(timer) = slot.timer.take() {
                    timer.cancel();
                }
            }
        }
    }

    fn arm(self: &Arc<Self>, slot: &mut Slot<A>, delay: Duration) {
        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;

        if let Some(previous) = slot.timer.take() {
            previous.cancel();
        }

        let weak = Arc::downgrade(self);
        let timer = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.on_timer(generation);
                }
            }),
        );
        slot.timer = Some(timer);
        trace!(mode = %self.config.mode, ?delay, generation, "timer armed");
    }

    fn on_timer(self: &Arc<Self>, generation: u64) {
        let now = self.scheduler.now();
        let fire = {
            let mut slot = self.slot.lock();
            if slot.generation != generation {
                trace!(generation, current = slot.generation, "stale timer ignored");
                return;
            }
            if let Some(fired) = slot.timer.take() {
                fired.detach();
            }

            let step = slot.machine.on_expiry(now);
            self.apply(&mut slot, step.timer);
            step.fire
        };

        match fire {
            Some(args) => {
                debug!(mode = %self.config.mode, "trailing invocation");
                self.invoke(args);
            }
            None => trace!(mode = %self.config.mode, "window closed without invocation"),
        }
    }

    fn invoke(&self, args: A) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        (self.action)(args);
    }
}

/// Rate governor wrapping an action
///
/// Clones share one state machine and one timer slot. Dropping the last
/// clone cancels any pending invocation.
///
/// # Example
/// ```
/// use quench_core_governor::{Governor, ManualScheduler};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let clock = ManualScheduler::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
///
/// let search = Governor::debounce(Duration::from_millis(100), clock.clone(), move |q: String| {
///     sink.lock().unwrap().push(q);
/// })
/// .unwrap();
///
/// search.trigger("r".to_string());
/// clock.advance(Duration::from_millis(30));
/// search.trigger("ru".to_string());
/// clock.advance(Duration::from_millis(30));
/// search.trigger("rust".to_string());
/// clock.advance(Duration::from_millis(100));
///
/// assert_eq!(*seen.lock().unwrap(), vec!["rust".to_string()]);
/// ```
pub struct Governor<A: Send + 'static> {
    shared: Arc<Shared<A>>,
}

impl<A: Send + 'static> Governor<A> {
    /// Create a governor from a configuration, a scheduler and an action
    pub fn new<S, F>(config: GovernorConfig, scheduler: S, action: F) -> Result<Self>
    where
        S: Scheduler,
        F: Fn(A) + Send + Sync + 'static,
    {
        config.validate()?;

        let machine = match config.mode {
            GovernorMode::Debounce => {
                Machine::Debounce(DebounceMachine::new(config.interval, config.immediate))
            }
            GovernorMode::Throttle => Machine::Throttle(ThrottleMachine::new(config.interval)),
        };

        debug!(
            mode = %config.mode,
            interval_ms = u64::try_from(config.interval.as_millis()).unwrap_or(u64::MAX),
            immediate = config.immediate,
            "governor created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                scheduler: Arc::new(scheduler),
                action: Box::new(action),
                slot: Mutex::new(Slot {
                    machine,
                    timer: None,
                    generation: 0,
                }),
                invocations: AtomicU64::new(0),
            }),
        })
    }

    /// Debounce `action` with the given quiet period
    pub fn debounce<S, F>(interval: Duration, scheduler: S, action: F) -> Result<Self>
    where
        S: Scheduler,
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::new(GovernorConfig::debounce(interval), scheduler, action)
    }

    /// Throttle `action` to at most once per `interval`
    pub fn throttle<S, F>(interval: Duration, scheduler: S, action: F) -> Result<Self>
    where
        S: Scheduler,
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::new(GovernorConfig::throttle(interval), scheduler, action)
    }

    /// Feed one trigger event
    ///
    /// Returns immediately. If the state machine decides the action fires
    /// now, it runs on the caller's thread before this returns.
    pub fn trigger(&self, args: A) {
        let shared = &self.shared;
        let now = shared.scheduler.now();

        let fire = {
            let mut slot = shared.slot.lock();
            let step = slot.machine.on_trigger(now, args);
            shared.apply(&mut slot, step.timer);
            step.fire
        };

        if let Some(args) = fire {
            trace!(mode = %shared.config.mode, "immediate invocation");
            shared.invoke(args);
        }
    }

    /// Cancel any pending invocation
    ///
    /// Once this returns, the pending invocation will not run. Returns
    /// whether an invocation was pending; with nothing pending this is a
    /// no-op.
    pub fn cancel(&self) -> bool {
        let mut slot = self.shared.slot.lock();
        let dropped = slot.machine.cancel();
        self.shared.apply(&mut slot, TimerCommand::Clear);
        if dropped {
            debug!(mode = %self.shared.config.mode, "pending invocation cancelled");
        }
        dropped
    }

    /// Current state
    pub fn state(&self) -> GovernorState {
        let now = self.shared.scheduler.now();
        self.shared.slot.lock().machine.state_at(now)
    }

    /// Whether a trailing invocation is waiting to fire
    pub fn is_pending(&self) -> bool {
        self.shared.slot.lock().machine.is_pending()
    }

    /// Number of times the action has been invoked
    pub fn invocations(&self) -> u64 {
        self.shared.invocations.load(Ordering::Relaxed)
    }

    /// The configuration this governor was built with
    pub fn config(&self) -> &GovernorConfig {
        &self.shared.config
    }
}

impl<A: Send + 'static> Clone for Governor<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: Send + 'static> fmt::Debug for Governor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Governor")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .field("invocations", &self.invocations())
            .finish()
    }
}
