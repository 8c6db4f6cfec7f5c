//! Operator console
//!
//! A reader thread turns stdin lines into signals for the polling loops.
//! An empty line (or anything unrecognised) confirms the current prompt;
//! on the robot side a keyword performs an operator action on the
//! simulated robot.

use std::io::{self, BufRead};
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::{debug, warn};

use opstate_core::state::OperatorAction;

/// Capacity for queued operator actions
const ACTION_CHANNEL_SIZE: usize = 8;

/// Set when the operator presses Enter
pub static CONFIRM: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Actions typed at the robot-side console
pub static ACTIONS: Channel<CriticalSectionRawMutex, OperatorAction, ACTION_CHANNEL_SIZE> =
    Channel::new();

/// Input parsed from one console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    Confirm,
    Action(OperatorAction),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        let action = match line.trim().to_ascii_lowercase().as_str() {
            "home" => OperatorAction::HomeDevice,
            "busy" => OperatorAction::InduceBusy,
            "pause" => OperatorAction::PauseDevice,
            "restart" => OperatorAction::RestartDevice,
            "estop" => OperatorAction::CycleEstop,
            "start" => OperatorAction::StartTracing,
            _ => return ConsoleInput::Confirm,
        };
        ConsoleInput::Action(action)
    }
}

/// Start the stdin reader thread
pub fn spawn_reader() -> io::Result<()> {
    thread::Builder::new()
        .name("console".into())
        .spawn(|| {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Console read failed: {}", e);
                        break;
                    }
                };
                match ConsoleInput::parse(&line) {
                    ConsoleInput::Confirm => CONFIRM.signal(()),
                    ConsoleInput::Action(action) => {
                        debug!("Console action {:?}", action);
                        if ACTIONS.try_send(action).is_err() {
                            warn!("Dropped console action {:?}", action);
                        }
                        CONFIRM.signal(());
                    }
                }
            }
            debug!("Console closed");
        })
        .map(|_| ())
}

/// Take a pending confirmation, if any
pub fn take_confirm() -> bool {
    CONFIRM.try_take().is_some()
}

/// Show an operator prompt
pub fn prompt(action: OperatorAction) {
    println!(">> {}", action.text());
}
