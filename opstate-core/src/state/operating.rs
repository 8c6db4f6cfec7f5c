//! Operating-state vocabulary
//!
//! The device owns its state; the engine only observes snapshots of it and
//! sends commands that request transitions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Top-level operating state
///
/// Exactly one of these holds at any observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatingState {
    /// Power to actuators removed (also the e-stop landing state)
    #[default]
    Disabled,
    /// Actuators powered and accepting motion
    Enabled,
    /// Powered but holding position
    Paused,
}

impl OperatingState {
    /// Single-character code used in compact traces
    pub fn code(&self) -> char {
        match self {
            OperatingState::Disabled => 'D',
            OperatingState::Enabled => 'E',
            OperatingState::Paused => 'P',
        }
    }
}

/// One observation of the device
///
/// `homed`, `homing`, `busy` and `estopped` are modifiers reported alongside
/// the operating state. `connected` is false until the first status message
/// from the device has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceSnapshot {
    pub state: OperatingState,
    pub homed: bool,
    pub homing: bool,
    pub busy: bool,
    pub estopped: bool,
    pub connected: bool,
}

impl DeviceSnapshot {
    /// Snapshot of a freshly started device: connected, disabled, not homed
    pub const fn powered_up() -> Self {
        Self {
            state: OperatingState::Disabled,
            homed: false,
            homing: false,
            busy: false,
            estopped: false,
            connected: true,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.state == OperatingState::Disabled
    }

    pub fn is_enabled(&self) -> bool {
        self.state == OperatingState::Enabled
    }

    pub fn is_paused(&self) -> bool {
        self.state == OperatingState::Paused
    }
}

/// Commands the engine can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    Enable,
    Disable,
    Home,
    Unhome,
    Pause,
    Resume,
}

impl Command {
    /// Lowercase name as used on the wire and in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Enable => "enable",
            Command::Disable => "disable",
            Command::Home => "home",
            Command::Unhome => "unhome",
            Command::Pause => "pause",
            Command::Resume => "resume",
        }
    }
}

/// A predicate over a snapshot, checked by expect and wait steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Condition {
    Disabled,
    Enabled,
    Paused,
    Homed,
    NotHomed,
    Homing,
    Busy,
}

impl Condition {
    /// Check the predicate against a snapshot
    pub fn holds(&self, snapshot: &DeviceSnapshot) -> bool {
        match self {
            Condition::Disabled => snapshot.is_disabled(),
            Condition::Enabled => snapshot.is_enabled(),
            Condition::Paused => snapshot.is_paused(),
            Condition::Homed => snapshot.homed,
            Condition::NotHomed => !snapshot.homed,
            Condition::Homing => snapshot.homing,
            Condition::Busy => snapshot.busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powered_up_snapshot() {
        let snap = DeviceSnapshot::powered_up();
        assert!(snap.connected);
        assert!(snap.is_disabled());
        assert!(Condition::NotHomed.holds(&snap));
        assert!(!Condition::Homing.holds(&snap));
    }

    #[test]
    fn test_default_snapshot_is_disconnected() {
        assert!(!DeviceSnapshot::default().connected);
    }

    #[test]
    fn test_operating_conditions_are_exclusive() {
        for state in [
            OperatingState::Disabled,
            OperatingState::Enabled,
            OperatingState::Paused,
        ] {
            let snap = DeviceSnapshot {
                state,
                ..DeviceSnapshot::powered_up()
            };
            let held = [Condition::Disabled, Condition::Enabled, Condition::Paused]
                .iter()
                .filter(|c| c.holds(&snap))
                .count();
            assert_eq!(held, 1);
        }
    }

    #[test]
    fn test_modifier_conditions() {
        let snap = DeviceSnapshot {
            state: OperatingState::Enabled,
            homed: true,
            busy: true,
            ..DeviceSnapshot::powered_up()
        };
        assert!(Condition::Homed.holds(&snap));
        assert!(!Condition::NotHomed.holds(&snap));
        assert!(Condition::Busy.holds(&snap));
        assert!(!Condition::Homing.holds(&snap));
    }
}
