//! Shared vocabulary of the governor state machines

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Externally visible governor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GovernorState {
    /// Nothing pending; the next trigger starts a new burst or fires at once
    Idle,
    /// Debounce: a deferred invocation is waiting for quiet
    Scheduled,
    /// Throttle: the action fired recently and the window has not closed
    CoolingDown,
}

impl fmt::Display for GovernorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernorState::Idle => write!(f, "idle"),
            GovernorState::Scheduled => write!(f, "scheduled"),
            GovernorState::CoolingDown => write!(f, "cooling-down"),
        }
    }
}

/// What the driver must do with its single timer slot after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Leave the current timer (or lack of one) alone
    Keep,
    /// Cancel any current timer and arm a new one after the delay
    Arm(Duration),
    /// Cancel any current timer
    Clear,
}

/// Outcome of feeding one event into a state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<A> {
    /// Arguments to invoke the action with, if it should fire now
    pub fire: Option<A>,
    /// Timer slot instruction
    pub timer: TimerCommand,
}

impl<A> Step<A> {
    pub(crate) fn new(fire: Option<A>, timer: TimerCommand) -> Self {
        Self { fire, timer }
    }

    pub(crate) fn nothing() -> Self {
        Self::new(None, TimerCommand::Keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_kebab_case() {
        let states = [
            GovernorState::Idle,
            GovernorState::Scheduled,
            GovernorState::CoolingDown,
        ];
        let json = serde_json::to_string(&states).unwrap();
        assert_eq!(json, r#"["idle","scheduled","cooling-down"]"#);

        // Display matches the wire form
        for state in states {
            assert_eq!(
                serde_json::to_value(state).unwrap(),
                serde_json::Value::String(state.to_string())
            );
        }
    }
}
