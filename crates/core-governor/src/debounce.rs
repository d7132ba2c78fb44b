//! Debounce state machine
//!
//! ```text
//!             trigger (fire now if immediate)
//!   ┌──────┐ ─────────────────────────────────▶ ┌───────────┐
//!   │ Idle │                                    │ Scheduled │ ◀─┐ trigger:
//!   └──────┘ ◀───────────────────────────────── └───────────┘ ──┘ record args,
//!             expiry: fire owed args  /  cancel                   restart timer
//! ```
//!
//! With `immediate`, the leading trigger fires synchronously and the trailing
//! invocation is owed only if another trigger arrives in the same burst.

use crate::state::{GovernorState, Step, TimerCommand};
use std::time::Duration;

#[derive(Debug)]
enum DebounceState<A> {
    Idle,
    /// `owed` holds the latest arguments not yet delivered
    Scheduled { owed: Option<A> },
}

/// Pure debounce transitions, independent of any timer implementation
#[derive(Debug)]
pub struct DebounceMachine<A> {
    interval: Duration,
    immediate: bool,
    state: DebounceState<A>,
}

impl<A> DebounceMachine<A> {
    /// Create a machine with the given quiet period
    pub fn new(interval: Duration, immediate: bool) -> Self {
        Self {
            interval,
            immediate,
            state: DebounceState::Idle,
        }
    }

    /// A trigger arrived
    pub fn on_trigger(&mut self, args: A) -> Step<A> {
        let restart = TimerCommand::Arm(self.interval);
        if let DebounceState::Scheduled { owed } = &mut self.state {
            *owed = Some(args);
            return Step::new(None, restart);
        }

        if self.immediate {
            self.state = DebounceState::Scheduled { owed: None };
            Step::new(Some(args), restart)
        } else {
            self.state = DebounceState::Scheduled { owed: Some(args) };
            Step::new(None, restart)
        }
    }

    /// The quiet-period timer expired
    pub fn on_expiry(&mut self) -> Step<A> {
        match std::mem::replace(&mut self.state, DebounceState::Idle) {
            DebounceState::Idle => Step::nothing(),
            DebounceState::Scheduled { owed } => Step::new(owed, TimerCommand::Clear),
        }
    }

    /// Drop the pending invocation and return to idle
    ///
    /// Returns whether a trailing invocation was owed. After an immediate
    /// call with no followers nothing is owed, so this returns false.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.state = DebounceState::Idle;
        was_pending
    }

    /// Whether a trailing invocation is currently owed
    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Scheduled { owed: Some(_) })
    }

    /// Current state
    pub fn state(&self) -> GovernorState {
        match self.state {
            DebounceState::Idle => GovernorState::Idle,
            DebounceState::Scheduled { .. } => GovernorState::Scheduled,
        }
    }
}
