//! The switch-state machine: current output state, its entry time, and
//! minimum-dwell discipline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The director's output state. Serializes to the exact uppercase strings
/// expected by existing mixer-side clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchState {
    Wide,
    Active,
    Stopped,
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SwitchState::Wide => "WIDE",
            SwitchState::Active => "ACTIVE",
            SwitchState::Stopped => "STOPPED",
        };
        write!(f, "{}", s)
    }
}

/// Holds the current state and when it was entered.
///
/// Re-entering the current state via `set` is a no-op: the entry timestamp
/// is only updated on an actual state change, so dwell time is never reset
/// by a redundant transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateMachine {
    state: SwitchState,
    entered_at: f64,
}

impl StateMachine {
    /// Construct a state machine starting in `WIDE`, entered at `at`.
    pub fn new(at: f64) -> Self {
        Self {
            state: SwitchState::Wide,
            entered_at: at,
        }
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    /// Transition to `new_state`. A no-op, including the entry timestamp,
    /// when `new_state` equals the current state.
    pub fn set(&mut self, new_state: SwitchState, at: f64) {
        if new_state != self.state {
            self.state = new_state;
            self.entered_at = at;
        }
    }

    /// Time spent in the current state as of `at`.
    pub fn duration(&self, at: f64) -> f64 {
        at - self.entered_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_wide() {
        let sm = StateMachine::new(5.0);
        assert_eq!(sm.state(), SwitchState::Wide);
        assert_eq!(sm.entered_at(), 5.0);
    }

    #[test]
    fn reentering_same_state_is_noop() {
        let mut sm = StateMachine::new(0.0);
        sm.set(SwitchState::Wide, 10.0);
        assert_eq!(sm.entered_at(), 0.0);
    }

    #[test]
    fn transition_updates_entry_time() {
        let mut sm = StateMachine::new(0.0);
        sm.set(SwitchState::Active, 3.0);
        assert_eq!(sm.state(), SwitchState::Active);
        assert_eq!(sm.entered_at(), 3.0);
    }

    #[test]
    fn duration_measures_from_entry() {
        let sm = StateMachine::new(5.0);
        assert_eq!(sm.duration(8.5), 3.5);
    }

    #[test]
    fn serializes_to_exact_strings() {
        assert_eq!(serde_json::to_string(&SwitchState::Wide).unwrap(), "\"WIDE\"");
        assert_eq!(serde_json::to_string(&SwitchState::Active).unwrap(), "\"ACTIVE\"");
        assert_eq!(
            serde_json::to_string(&SwitchState::Stopped).unwrap(),
            "\"STOPPED\""
        );
    }
}
