//! Operator intent versus actual enabled state.
//!
//! A device exposes one on/off switch, but two different parties move it:
//! the operator, and the controller when oxidizer runs out or comes back.
//! The machine tracks them separately so that a fuel-starved device comes
//! back on by itself once oxidizer returns, while an operator OFF stays OFF.
//!
//! Every write the controller makes to the switch echoes back as an
//! enabled-changed notification. A single-use guard marks that echo so it is
//! not mistaken for an operator action.
//!
//! # Transition table
//!
//! | `wants_on` | oxidizer | state | target |
//! |---|---|---|---|
//! | false | not checked | `OperatorOff` | off |
//! | true | satisfied | `OperatorOnAndSupplied` | on |
//! | true | short | `OperatorOnAndStarved` | off |
//!
//! When the target differs from the actual switch position the guard is
//! armed and the caller performs the write. The notification that follows
//! disarms the guard and leaves `wants_on` alone; any notification that
//! arrives with the guard disarmed is the operator and updates `wants_on`.

use serde::{Deserialize, Serialize};

use crate::constants::OXIDIZER_PER_FUEL;

/// Derived state of a combustion device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnableState {
    OperatorOff,
    OperatorOnAndSupplied,
    OperatorOnAndStarved,
}

impl EnableState {
    /// Whether the device should actually run in this state.
    pub fn target_enabled(self) -> bool {
        matches!(self, Self::OperatorOnAndSupplied)
    }
}

/// Per-device intent/actual reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnableStateMachine {
    wants_on: bool,
    internal_write_pending: bool,
    state: EnableState,
}

impl EnableStateMachine {
    /// Start from the switch position the device already has, so loading a
    /// vehicle never flips anything.
    pub fn new(current_enabled: bool) -> Self {
        Self {
            wants_on: current_enabled,
            internal_write_pending: false,
            state: if current_enabled {
                EnableState::OperatorOnAndSupplied
            } else {
                EnableState::OperatorOff
            },
        }
    }

    pub fn wants_on(&self) -> bool {
        self.wants_on
    }

    pub fn state(&self) -> EnableState {
        self.state
    }

    /// True between a controller write and the notification it triggers.
    pub fn internal_write_pending(&self) -> bool {
        self.internal_write_pending
    }

    /// Run one tick of reconciliation.
    ///
    /// `supply` performs the oxidizer draw for this tick and reports whether
    /// it was satisfied; it is only called while the operator wants the
    /// device on. Returns the value the caller must write to the switch, if
    /// any. The write must be delivered back through
    /// [`on_enabled_changed`](Self::on_enabled_changed) before anything else
    /// touches the switch.
    pub fn reconcile<F>(&mut self, actual_enabled: bool, supply: F) -> Option<bool>
    where
        F: FnOnce() -> bool,
    {
        self.state = if !self.wants_on {
            EnableState::OperatorOff
        } else if supply() {
            EnableState::OperatorOnAndSupplied
        } else {
            EnableState::OperatorOnAndStarved
        };

        let target = self.state.target_enabled();
        if target == actual_enabled {
            return None;
        }
        self.internal_write_pending = true;
        Some(target)
    }

    /// Handle an enabled-changed notification from the host.
    ///
    /// Returns `true` if the notification was an operator action.
    pub fn on_enabled_changed(&mut self, enabled: bool) -> bool {
        if self.internal_write_pending {
            self.internal_write_pending = false;
            return false;
        }
        self.wants_on = enabled;
        if !enabled {
            self.state = EnableState::OperatorOff;
        }
        true
    }

    /// Operator command arriving through the UI binding rather than the
    /// switch itself (e.g. a toggle on a device that is currently starved).
    pub fn set_operator_intent(&mut self, wants_on: bool) {
        self.wants_on = wants_on;
    }
}

/// Oxidizer litres needed for one tick at `fuel_rate` L/s.
pub fn required_oxidizer(fuel_rate: f32, delta_time: f32) -> f64 {
    (fuel_rate * OXIDIZER_PER_FUEL * delta_time).max(0.0) as f64
}
