//! Step tables for the eight operating-state scenarios
//!
//! Step numbers are the failure codes a case reports. Gaps in the numbering
//! are checks the device cannot report (e-stop, raw homing flags) and are
//! not executed.

use crate::config::Span;
use crate::state::{Command, Condition, OperatorAction};
use crate::step::{Step, StepSpec};

/// {disabled, not homed} + enable -> {enabled}
pub static CASE_1: [StepSpec; 6] = [
    StepSpec::expect(1, Condition::Disabled),
    StepSpec::expect(2, Condition::NotHomed),
    StepSpec::send(3, Command::Enable),
    StepSpec::send_marked(4, Command::Home),
    StepSpec::settle(5, Span::HomingStart),
    StepSpec::expect(6, Condition::Enabled),
];

/// {paused, homed} + resume -> {enabled}, then {enabled, busy} + pause -> {paused}
pub static CASE_2: [StepSpec; 8] = [
    StepSpec::confirm(OperatorAction::HomeDevice),
    StepSpec::retry(1, Command::Pause, Condition::Paused, false),
    StepSpec::retry(2, Command::Resume, Condition::Enabled, true),
    StepSpec::confirm(OperatorAction::InduceBusy),
    StepSpec::expect(4, Condition::Busy),
    StepSpec::send_marked(5, Command::Pause),
    StepSpec::settle(6, Span::Settle),
    StepSpec::expect(7, Condition::Paused),
];

/// {paused} + disable -> {disabled}, then {disabled, homed} + unhome -> {not homed}
pub static CASE_3: [StepSpec; 9] = [
    StepSpec::confirm(OperatorAction::PauseDevice),
    StepSpec::expect(1, Condition::Paused),
    StepSpec::send_marked(3, Command::Disable),
    StepSpec::settle(4, Span::Settle),
    StepSpec::expect(5, Condition::Disabled),
    StepSpec::expect(7, Condition::Homed),
    StepSpec::send_marked(8, Command::Unhome),
    StepSpec::settle(9, Span::Brief),
    StepSpec::expect(11, Condition::NotHomed),
];

/// {enabled, homing} + pause -> {paused} (or {disabled} where pausing escalates)
pub static CASE_4: [StepSpec; 12] = [
    StepSpec::confirm(OperatorAction::RestartDevice),
    StepSpec::send(2, Command::Enable),
    StepSpec::send_marked(2, Command::Home),
    StepSpec::wait_for(3, Condition::Homing, Span::HomingStart),
    StepSpec::settle(4, Span::Settle),
    StepSpec::send_marked(5, Command::Pause),
    StepSpec::settle(6, Span::Brief),
    StepSpec::new(8, Step::PauseOutcome),
    StepSpec::expect(9, Condition::NotHomed),
    StepSpec::send_marked(10, Command::Unhome),
    StepSpec::settle(11, Span::Brief),
    StepSpec::expect(13, Condition::NotHomed),
];

/// {enabled, homing} + disable -> {disabled}
pub static CASE_5: [StepSpec; 9] = [
    StepSpec::confirm(OperatorAction::RestartDevice),
    StepSpec::send(2, Command::Enable),
    StepSpec::send_marked(2, Command::Home),
    StepSpec::wait_for(3, Condition::Homing, Span::HomingStart),
    StepSpec::settle(4, Span::Settle),
    StepSpec::send_marked(5, Command::Disable),
    StepSpec::settle(6, Span::Brief),
    StepSpec::expect(8, Condition::Disabled),
    StepSpec::expect(9, Condition::NotHomed),
];

/// {enabled, homing} + unhome -> {disabled, not homed}
pub static CASE_6: [StepSpec; 9] = [
    StepSpec::confirm(OperatorAction::RestartDevice),
    StepSpec::send(2, Command::Enable),
    StepSpec::send_marked(2, Command::Home),
    StepSpec::wait_for(3, Condition::Homing, Span::HomingStart),
    StepSpec::settle(4, Span::Settle),
    StepSpec::send_marked(5, Command::Unhome),
    StepSpec::settle(6, Span::Brief),
    StepSpec::expect(8, Condition::Disabled),
    StepSpec::expect(9, Condition::NotHomed),
];

/// {paused, homed} + unhome -> {disabled, not homed}
pub static CASE_7: [StepSpec; 9] = [
    StepSpec::confirm(OperatorAction::RestartDevice),
    StepSpec::send(2, Command::Enable),
    StepSpec::send_marked(2, Command::Home),
    StepSpec::wait_for(3, Condition::Homing, Span::HomingStart),
    StepSpec::wait_then(4, Condition::Homed, Span::HomingFinish, Command::Pause),
    StepSpec::send_marked(5, Command::Unhome),
    StepSpec::settle(6, Span::Brief),
    StepSpec::expect(8, Condition::Disabled),
    StepSpec::expect(9, Condition::NotHomed),
];

/// Home from {disabled, not homed}, then from {paused, homed}, then from
/// {enabled, homed}
pub static CASE_8: [StepSpec; 29] = [
    // From disabled
    StepSpec::expect(1, Condition::Disabled),
    StepSpec::expect(2, Condition::NotHomed),
    StepSpec::new(0, Step::EstopCue),
    StepSpec::send_marked(3, Command::Home),
    StepSpec::wait_for(4, Condition::Homing, Span::HomingStart),
    StepSpec::settle(5, Span::Settle),
    StepSpec::expect(7, Condition::Enabled),
    StepSpec::expect(8, Condition::Homing),
    StepSpec::wait_then(9, Condition::Homed, Span::HomingFinish, Command::Pause),
    StepSpec::expect(11, Condition::Paused),
    StepSpec::expect(12, Condition::Homed),
    // From paused
    StepSpec::new(0, Step::EstopCue),
    StepSpec::send_marked(13, Command::Home),
    StepSpec::wait_for(14, Condition::Homing, Span::HomingStart),
    StepSpec::settle(15, Span::Settle),
    StepSpec::expect(17, Condition::Enabled),
    StepSpec::expect(18, Condition::Homing),
    StepSpec::wait_then(19, Condition::Homed, Span::HomingFinish, Command::Pause),
    StepSpec::expect(20, Condition::Homed),
    // From enabled
    StepSpec::send_marked(21, Command::Resume),
    StepSpec::settle(22, Span::Brief),
    StepSpec::expect(23, Condition::Enabled),
    StepSpec::new(0, Step::EstopCue),
    StepSpec::send_marked(24, Command::Home),
    StepSpec::wait_for(25, Condition::Homing, Span::HomingStart),
    StepSpec::settle(26, Span::Settle),
    StepSpec::expect(28, Condition::Enabled),
    StepSpec::expect(29, Condition::Homing),
    StepSpec::wait_for(30, Condition::Homed, Span::HomingFinish),
];
