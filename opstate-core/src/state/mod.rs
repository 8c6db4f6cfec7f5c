//! Operating-state vocabulary and engine events
//!
//! Describes what the device reports, what the engine may ask of it, and
//! the events the engine records while doing so.

pub mod events;
pub mod operating;

pub use events::{Event, Journal, OperatorAction, JOURNAL_DEPTH};
pub use operating::{Command, Condition, DeviceSnapshot, OperatingState};
