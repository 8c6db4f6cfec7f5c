//! Step table vocabulary
//!
//! A test case is a static slice of [`StepSpec`]s. Each entry pairs one
//! step with the number reported when that step fails.

use crate::config::Span;
use crate::state::{Command, Condition, OperatorAction};

/// One unit of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Prompt the operator once, then hold until the tick is confirmed
    Confirm(OperatorAction),
    /// Prompt the operator to cycle the e-stop when the family needs it
    EstopCue,
    /// Fail unless the condition holds right now
    Expect(Condition),
    /// Send a command; `mark` re-anchors the step timer
    Send { command: Command, mark: bool },
    /// Hold until the named delay has passed since the anchor
    Settle(Span),
    /// Hold until the condition holds, failing once the timeout has passed
    ///
    /// Detection re-anchors the timer and sends `then`, if any.
    WaitFor {
        condition: Condition,
        timeout: Span,
        then: Option<Command>,
    },
    /// Send the command every tick until the condition holds, at most
    /// `retry_limit` times
    RetryUntil {
        condition: Condition,
        command: Command,
        mark: bool,
    },
    /// Check how the device reacted to a pause issued while homing
    ///
    /// Families that escalate must be disabled. Others must be paused and
    /// are then disabled by this step.
    PauseOutcome,
}

/// A step with its documented failure number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepSpec {
    /// Positive step number; a failure reports its negation
    pub code: u8,
    pub step: Step,
}

impl StepSpec {
    pub const fn new(code: u8, step: Step) -> Self {
        Self { code, step }
    }

    pub const fn confirm(action: OperatorAction) -> Self {
        Self::new(0, Step::Confirm(action))
    }

    pub const fn expect(code: u8, condition: Condition) -> Self {
        Self::new(code, Step::Expect(condition))
    }

    pub const fn send(code: u8, command: Command) -> Self {
        Self::new(code, Step::Send { command, mark: false })
    }

    /// Send and re-anchor the step timer
    pub const fn send_marked(code: u8, command: Command) -> Self {
        Self::new(code, Step::Send { command, mark: true })
    }

    pub const fn settle(code: u8, span: Span) -> Self {
        Self::new(code, Step::Settle(span))
    }

    pub const fn wait_for(code: u8, condition: Condition, timeout: Span) -> Self {
        Self::new(
            code,
            Step::WaitFor {
                condition,
                timeout,
                then: None,
            },
        )
    }

    /// Wait for the condition, then send `command` on detection
    pub const fn wait_then(code: u8, condition: Condition, timeout: Span, command: Command) -> Self {
        Self::new(
            code,
            Step::WaitFor {
                condition,
                timeout,
                then: Some(command),
            },
        )
    }

    pub const fn retry(code: u8, command: Command, condition: Condition, mark: bool) -> Self {
        Self::new(
            code,
            Step::RetryUntil {
                condition,
                command,
                mark,
            },
        )
    }

    /// Failure code as reported in a verdict
    pub fn failure_code(&self) -> i32 {
        -(self.code as i32)
    }
}
