//! Engine events and the journal that carries them to the host
//!
//! The engine never logs. Each tick records what it did into a [`Journal`];
//! the host drains it after the tick and prints the trace.

use heapless::Deque;

use super::operating::{Command, Condition};
use crate::cases::CaseId;
use crate::cube::{ArmId, Heading};

/// Maximum number of undrained events kept by a journal
pub const JOURNAL_DEPTH: usize = 16;

/// Things the operator is asked to do at a human synchronization point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatorAction {
    /// Home the device by hand
    HomeDevice,
    /// Put the device into a busy motion
    InduceBusy,
    /// Pause the device if it is not already
    PauseDevice,
    /// Terminate and restart the device software
    RestartDevice,
    /// Press and release the e-stop, then re-enable (notice only)
    CycleEstop,
    /// Start and home the device before tracing
    StartTracing,
}

impl OperatorAction {
    /// Operator-facing text
    pub fn text(&self) -> &'static str {
        match self {
            OperatorAction::HomeDevice => "Please home the robot and press 'Enter'.",
            OperatorAction::InduceBusy => "Please make the robot busy, then press 'Enter'.",
            OperatorAction::PauseDevice => {
                "Please pause the robot (if it's not already) and press 'Enter'."
            }
            OperatorAction::RestartDevice => {
                "Please terminate the robot software and restart it. Press 'Enter' when done."
            }
            OperatorAction::CycleEstop => "Press and release the e-stop, then re-enable.",
            OperatorAction::StartTracing => {
                "Start and home the robot if not already, then press 'Enter'."
            }
        }
    }

    /// Whether the engine holds until the operator confirms
    pub fn needs_confirmation(&self) -> bool {
        !matches!(self, OperatorAction::CycleEstop)
    }
}

/// Something the engine did or observed during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// First connected snapshot seen, settle delay started
    LinkUp,
    /// Settle window passed with no connected snapshot
    AwaitingLink,
    /// A case became active
    CaseStarted(CaseId),
    /// The operator is asked to act
    Prompt(OperatorAction),
    /// A command went out to the device
    CommandSent(Command),
    /// A wait step observed its condition
    Detected(Condition),
    /// A wait step ran past its deadline
    Timeout { case: CaseId, code: i32 },
    /// Case completed every step
    CasePassed(CaseId),
    /// Case stopped at a failing step
    CaseFailed { case: CaseId, code: i32 },
    /// All cases done, safing command sent
    SuiteFinished { errors: u8 },
    /// Tracing arm reached its starting vertex
    ArmLowered(ArmId),
    /// Tracing arm began a new cube edge
    EdgeStarted { arm: ArmId, heading: Heading },
    /// Arm reported a failed move; held and restarted next tick
    MoveFailed(ArmId),
}

impl Event {
    /// Check if this event reports a problem
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Event::Timeout { .. } | Event::CaseFailed { .. } | Event::MoveFailed(_)
        ) || matches!(self, Event::SuiteFinished { errors } if *errors > 0)
    }
}

/// Bounded event queue
///
/// When full, the oldest event is dropped so the newest outcome is never
/// lost.
#[derive(Debug, Default)]
pub struct Journal {
    events: Deque<Event, JOURNAL_DEPTH>,
}

impl Journal {
    /// Create an empty journal
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Append an event
    pub fn record(&mut self, event: Event) {
        if self.events.is_full() {
            self.events.pop_front();
        }
        let _ = self.events.push_back(event);
    }

    /// Take the oldest undrained event
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over undrained events without consuming them
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_fifo() {
        let mut journal = Journal::new();
        journal.record(Event::LinkUp);
        journal.record(Event::CommandSent(Command::Enable));
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.pop(), Some(Event::LinkUp));
        assert_eq!(journal.pop(), Some(Event::CommandSent(Command::Enable)));
        assert!(journal.pop().is_none());
    }

    #[test]
    fn test_journal_drops_oldest_when_full() {
        let mut journal = Journal::new();
        for _ in 0..JOURNAL_DEPTH {
            journal.record(Event::AwaitingLink);
        }
        journal.record(Event::SuiteFinished { errors: 0 });
        assert_eq!(journal.len(), JOURNAL_DEPTH);
        assert_eq!(
            journal.iter().last(),
            Some(&Event::SuiteFinished { errors: 0 })
        );
    }

    #[test]
    fn test_fault_events() {
        assert!(Event::CaseFailed {
            case: CaseId::new(1),
            code: -6
        }
        .is_fault());
        assert!(Event::SuiteFinished { errors: 2 }.is_fault());
        assert!(!Event::SuiteFinished { errors: 0 }.is_fault());
        assert!(!Event::CasePassed(CaseId::new(1)).is_fault());
    }

    #[test]
    fn test_estop_notice_needs_no_confirmation() {
        assert!(!OperatorAction::CycleEstop.needs_confirmation());
        assert!(OperatorAction::RestartDevice.needs_confirmation());
    }
}
