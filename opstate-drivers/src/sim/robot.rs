//! Simulated robot operating-state machine
//!
//! Commands take effect after a fixed latency. Homing starts a short while
//! after it is requested and then runs for a fixed time. The operator
//! actions the test cases ask for (homing by hand, making the robot busy,
//! restarting its software) are exposed as methods so an unattended run can
//! perform them.
//!
//! # Usage
//!
//! ```ignore
//! let mut robot = SimRobot::new(SimTiming::default(), DeviceFamily::Raven);
//!
//! // Every tick, before the engine looks at it:
//! robot.advance(now_ms);
//! suite.tick(&mut robot, now_ms, confirmed);
//! ```

use heapless::Deque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use opstate_core::config::DeviceFamily;
use opstate_core::state::{Command, DeviceSnapshot, OperatingState, OperatorAction};
use opstate_core::traits::Device;

/// Commands accepted but not yet applied
const MAX_IN_FLIGHT: usize = 16;

/// Simulated response times
///
/// `command_latency_ms` must stay below the engine's retry budget (retry
/// limit times the tick interval) or retry steps give up before the robot
/// reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimTiming {
    /// Delay between a command being sent and taking effect
    pub command_latency_ms: u32,
    /// Delay from the first `advance` until the robot reports connected
    pub link_delay_ms: u32,
    /// Delay from a home command until the homing flag shows
    pub homing_start_ms: u32,
    /// Time homing runs before the robot is homed
    pub homing_ms: u32,
    /// How long an operator-induced busy motion lasts
    pub busy_ms: u32,
}

impl Default for SimTiming {
    fn default() -> Self {
        Self {
            command_latency_ms: 50,
            link_delay_ms: 500,
            homing_start_ms: 500,
            homing_ms: 8_000,
            busy_ms: 5_000,
        }
    }
}

/// Simulated robot
#[derive(Debug)]
pub struct SimRobot {
    timing: SimTiming,
    family: DeviceFamily,
    now_ms: u64,
    booted_ms: Option<u64>,
    state: OperatingState,
    homed: bool,
    /// Time homing was requested
    homing_since: Option<u64>,
    busy_until: Option<u64>,
    estopped: bool,
    in_flight: Deque<(u64, Command), MAX_IN_FLIGHT>,
    dropped: u32,
}

impl SimRobot {
    pub fn new(timing: SimTiming, family: DeviceFamily) -> Self {
        Self {
            timing,
            family,
            now_ms: 0,
            booted_ms: None,
            state: OperatingState::Disabled,
            homed: false,
            homing_since: None,
            busy_until: None,
            estopped: false,
            in_flight: Deque::new(),
            dropped: 0,
        }
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Commands discarded because too many were in flight
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Move simulated time forward, applying due commands and finishing
    /// homing and busy motions
    pub fn advance(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.booted_ms.get_or_insert(now_ms);

        while let Some(&(due, command)) = self.in_flight.front() {
            if due > now_ms {
                break;
            }
            self.in_flight.pop_front();
            self.apply(command);
        }

        if let Some(since) = self.homing_since {
            let done = since + self.timing.homing_start_ms as u64 + self.timing.homing_ms as u64;
            if now_ms >= done {
                self.homing_since = None;
                self.homed = true;
            }
        }

        if matches!(self.busy_until, Some(until) if now_ms >= until) {
            self.busy_until = None;
        }
    }

    fn connected(&self) -> bool {
        match self.booted_ms {
            Some(boot) => self.now_ms.saturating_sub(boot) >= self.timing.link_delay_ms as u64,
            None => false,
        }
    }

    fn homing_visible(&self) -> bool {
        matches!(self.homing_since,
            Some(since) if self.now_ms >= since + self.timing.homing_start_ms as u64)
    }

    fn abort_motion(&mut self) {
        self.homing_since = None;
        self.busy_until = None;
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Enable => {
                if !self.estopped {
                    self.state = OperatingState::Enabled;
                }
            }
            Command::Disable => {
                self.abort_motion();
                self.state = OperatingState::Disabled;
            }
            Command::Home => {
                self.estopped = false;
                self.state = OperatingState::Enabled;
                self.homed = false;
                self.busy_until = None;
                self.homing_since = Some(self.now_ms);
            }
            Command::Unhome => {
                self.abort_motion();
                self.homed = false;
                self.state = OperatingState::Disabled;
            }
            Command::Pause => {
                if self.homing_since.is_some() {
                    self.abort_motion();
                    self.homed = false;
                    if self.family.pause_escalates() {
                        self.state = OperatingState::Disabled;
                        self.estopped = true;
                    } else {
                        self.state = OperatingState::Paused;
                    }
                } else if self.state == OperatingState::Enabled {
                    self.busy_until = None;
                    self.state = OperatingState::Paused;
                }
            }
            Command::Resume => {
                if self.state == OperatingState::Paused {
                    self.state = OperatingState::Enabled;
                }
            }
        }
    }

    /// Carry out what the operator was asked to do
    pub fn perform(&mut self, action: OperatorAction) {
        match action {
            OperatorAction::HomeDevice | OperatorAction::StartTracing => {
                self.abort_motion();
                self.estopped = false;
                self.homed = true;
                self.state = OperatingState::Enabled;
            }
            OperatorAction::InduceBusy => {
                if self.state == OperatingState::Enabled {
                    self.busy_until = Some(self.now_ms + self.timing.busy_ms as u64);
                }
            }
            OperatorAction::PauseDevice => {
                if self.state == OperatingState::Enabled {
                    self.abort_motion();
                    self.state = OperatingState::Paused;
                }
            }
            OperatorAction::RestartDevice => self.restart(),
            OperatorAction::CycleEstop => self.estopped = false,
        }
    }

    /// Restart the robot software: powered up, disabled and not homed
    pub fn restart(&mut self) {
        self.abort_motion();
        self.in_flight.clear();
        self.state = OperatingState::Disabled;
        self.homed = false;
        self.estopped = false;
    }
}

impl Device for SimRobot {
    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            state: self.state,
            homed: self.homed,
            homing: self.homing_visible(),
            busy: self.busy_until.is_some(),
            estopped: self.estopped,
            connected: self.connected(),
        }
    }

    fn send_command(&mut self, command: Command) {
        let due = self.now_ms + self.timing.command_latency_ms as u64;
        if self.in_flight.push_back((due, command)).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booted(family: DeviceFamily) -> SimRobot {
        let mut robot = SimRobot::new(SimTiming::default(), family);
        robot.advance(0);
        robot.advance(1_000);
        robot
    }

    fn command(robot: &mut SimRobot, command: Command) {
        robot.send_command(command);
        let now = robot.now_ms + robot.timing.command_latency_ms as u64;
        robot.advance(now);
    }

    #[test]
    fn test_link_comes_up_after_delay() {
        let mut robot = SimRobot::new(SimTiming::default(), DeviceFamily::Raven);
        assert!(!robot.snapshot().connected);
        robot.advance(10_000);
        assert!(!robot.snapshot().connected);
        robot.advance(10_499);
        assert!(!robot.snapshot().connected);
        robot.advance(10_500);
        assert!(robot.snapshot().connected);
    }

    #[test]
    fn test_command_latency() {
        let mut robot = booted(DeviceFamily::Raven);
        robot.send_command(Command::Enable);
        robot.advance(1_049);
        assert!(robot.snapshot().is_disabled());
        robot.advance(1_050);
        assert!(robot.snapshot().is_enabled());
    }

    #[test]
    fn test_homing_sequence() {
        let mut robot = booted(DeviceFamily::Raven);
        command(&mut robot, Command::Home);
        let start = robot.now_ms;
        assert!(robot.snapshot().is_enabled());
        assert!(!robot.snapshot().homing);

        robot.advance(start + 500);
        assert!(robot.snapshot().homing);
        assert!(!robot.snapshot().homed);

        robot.advance(start + 8_500);
        let snap = robot.snapshot();
        assert!(!snap.homing);
        assert!(snap.homed);
    }

    #[test]
    fn test_pause_while_homing_by_family() {
        let mut raven = booted(DeviceFamily::Raven);
        command(&mut raven, Command::Home);
        command(&mut raven, Command::Pause);
        let snap = raven.snapshot();
        assert!(snap.is_disabled());
        assert!(snap.estopped);
        assert!(!snap.homed);

        // The e-stop blocks enable until the operator cycles it
        command(&mut raven, Command::Enable);
        assert!(raven.snapshot().is_disabled());
        raven.perform(OperatorAction::CycleEstop);
        command(&mut raven, Command::Enable);
        assert!(raven.snapshot().is_enabled());

        let mut generic = booted(DeviceFamily::Generic);
        command(&mut generic, Command::Home);
        command(&mut generic, Command::Pause);
        assert!(generic.snapshot().is_paused());
        assert!(!generic.snapshot().estopped);
    }

    #[test]
    fn test_disable_keeps_homed() {
        let mut robot = booted(DeviceFamily::Raven);
        robot.perform(OperatorAction::HomeDevice);
        command(&mut robot, Command::Pause);
        command(&mut robot, Command::Disable);
        let snap = robot.snapshot();
        assert!(snap.is_disabled());
        assert!(snap.homed);

        command(&mut robot, Command::Unhome);
        assert!(!robot.snapshot().homed);
    }

    #[test]
    fn test_busy_clears_on_pause() {
        let mut robot = booted(DeviceFamily::Raven);
        robot.perform(OperatorAction::HomeDevice);
        robot.perform(OperatorAction::InduceBusy);
        assert!(robot.snapshot().busy);

        command(&mut robot, Command::Pause);
        let snap = robot.snapshot();
        assert!(snap.is_paused());
        assert!(!snap.busy);
    }

    #[test]
    fn test_restart_drops_pending_commands() {
        let mut robot = booted(DeviceFamily::Raven);
        robot.perform(OperatorAction::HomeDevice);
        robot.send_command(Command::Resume);
        robot.perform(OperatorAction::RestartDevice);
        robot.advance(robot.now_ms + 1_000);

        let snap = robot.snapshot();
        assert!(snap.is_disabled());
        assert!(!snap.homed);
        assert!(snap.connected);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_command() -> impl Strategy<Value = Command> {
            prop_oneof![
                Just(Command::Enable),
                Just(Command::Disable),
                Just(Command::Home),
                Just(Command::Unhome),
                Just(Command::Pause),
                Just(Command::Resume),
            ]
        }

        proptest! {
            #[test]
            fn prop_snapshot_flags_consistent(
                commands in proptest::collection::vec((arb_command(), 0u64..3_000), 1..40),
                generic in any::<bool>(),
            ) {
                let family = if generic { DeviceFamily::Generic } else { DeviceFamily::Raven };
                let mut robot = booted(family);
                let mut now = robot.now_ms;
                for (command, gap) in commands {
                    robot.send_command(command);
                    now += gap;
                    robot.advance(now);
                    let snap = robot.snapshot();
                    prop_assert!(!(snap.homing && snap.homed));
                    if snap.estopped {
                        prop_assert!(snap.is_disabled());
                    }
                    if snap.homing {
                        prop_assert!(snap.is_enabled());
                    }
                }
            }
        }
    }
}
