//! Device trait
//!
//! The engine sees the robot through two operations: a non-blocking state
//! snapshot and a fire-and-forget command. Whether a command took effect is
//! only ever learned from later snapshots.

use crate::state::{Command, DeviceSnapshot};

/// A robot whose operating state is under test
pub trait Device {
    /// Read the most recent operating state
    ///
    /// Must not block. Implementations that have not yet heard from the
    /// device report `connected == false`.
    fn snapshot(&self) -> DeviceSnapshot;

    /// Request a state transition
    ///
    /// There is no acknowledgement. The command may take effect after an
    /// arbitrary delay, or not at all.
    fn send_command(&mut self, command: Command);
}

impl<D: Device + ?Sized> Device for &mut D {
    fn snapshot(&self) -> DeviceSnapshot {
        (**self).snapshot()
    }

    fn send_command(&mut self, command: Command) {
        (**self).send_command(command)
    }
}
