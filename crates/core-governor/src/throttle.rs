//! Throttle state machine
//!
//! ```text
//!            trigger: fire now, arm window
//!   ┌───────┐ ─────────────────────────────▶ ┌──────────────┐ ◀─┐ trigger:
//!   │ Ready │                                │ CoolingDown  │ ──┘ record trailing
//!   └───────┘ ◀───────────────────────────── └──────────────┘ ◀─┐ expiry with
//!              expiry, nothing recorded                         ─┘ trailing: fire,
//!                                                                  arm new window
//! ```
//!
//! The action runs at most once per window. The window is anchored at the
//! last actual invocation, so a trailing invocation lands exactly at
//! `last_invoked_at + interval`.

use crate::state::{GovernorState, Step, TimerCommand};
use std::time::{Duration, Instant};

#[derive(Debug)]
enum ThrottleState<A> {
    Ready,
    CoolingDown { until: Instant, trailing: Option<A> },
}

/// Pure throttle transitions; time is supplied by the caller
#[derive(Debug)]
pub struct ThrottleMachine<A> {
    interval: Duration,
    state: ThrottleState<A>,
    last_invoked_at: Option<Instant>,
}

impl<A> ThrottleMachine<A> {
    /// Create a machine enforcing the given minimum spacing
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: ThrottleState::Ready,
            last_invoked_at: None,
        }
    }

    /// A trigger arrived at `now`
    pub fn on_trigger(&mut self, now: Instant, args: A) -> Step<A> {
        if self.interval.is_zero() {
            self.last_invoked_at = Some(now);
            return Step::new(Some(args), TimerCommand::Keep);
        }

        // A closed window whose timer has not run yet counts as ready
        let remaining = match &self.state {
            ThrottleState::CoolingDown { until, .. } if now < *until => *until - now,
            _ => return self.fire(now, args),
        };

        if let ThrottleState::CoolingDown { trailing, .. } = &mut self.state {
            *trailing = Some(args);
        }
        // Re-arm at the same deadline so the trailing call survives a cancel
        Step::new(None, TimerCommand::Arm(remaining))
    }

    /// The cooldown timer expired at `now`
    pub fn on_expiry(&mut self, now: Instant) -> Step<A> {
        match std::mem::replace(&mut self.state, ThrottleState::Ready) {
            ThrottleState::CoolingDown {
                trailing: Some(args),
                ..
            } => self.fire(now, args),
            ThrottleState::CoolingDown { trailing: None, .. } => {
                Step::new(None, TimerCommand::Clear)
            }
            ThrottleState::Ready => Step::nothing(),
        }
    }

    /// Drop any recorded trailing invocation
    ///
    /// The current window stays in force: a trigger before it closes is
    /// still deferred to the window's end. Returns whether a trailing
    /// invocation was dropped.
    pub fn cancel(&mut self) -> bool {
        match &mut self.state {
            ThrottleState::CoolingDown { trailing, .. } => trailing.take().is_some(),
            ThrottleState::Ready => false,
        }
    }

    /// Whether a trailing invocation is recorded
    pub fn is_pending(&self) -> bool {
        matches!(
            self.state,
            ThrottleState::CoolingDown {
                trailing: Some(_),
                ..
            }
        )
    }

    /// Instant of the most recent invocation
    pub fn last_invoked_at(&self) -> Option<Instant> {
        self.last_invoked_at
    }

    /// State as observed at `now`
    pub fn state_at(&self, now: Instant) -> GovernorState {
        match &self.state {
            ThrottleState::CoolingDown { trailing: None, until } if now >= *until => {
                GovernorState::Idle
            }
            ThrottleState::CoolingDown { .. } => GovernorState::CoolingDown,
            ThrottleState::Ready => GovernorState::Idle,
        }
    }

    fn fire(&mut self, now: Instant, args: A) -> Step<A> {
        self.last_invoked_at = Some(now);
        self.state = ThrottleState::CoolingDown {
            until: now + self.interval,
            trailing: None,
        };
        Step::new(Some(args), TimerCommand::Arm(self.interval))
    }
}
