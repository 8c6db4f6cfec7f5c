//! Resumable step machine
//!
//! Executes one step of a table per tick. Holds the position, the timer
//! anchor and the per-step scratch state (retry counter, prompt latch) that
//! must survive between ticks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::table::{Step, StepSpec};
use crate::cases::CaseId;
use crate::config::EngineConfig;
use crate::state::{Command, Condition, DeviceSnapshot, Event, Journal, OperatorAction};
use crate::traits::Device;

/// Outcome of a step machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Verdict {
    /// Still running
    #[default]
    Pending,
    /// Every step completed
    Passed,
    /// Stopped at a failing step; holds the negated step number
    Failed(i32),
}

impl Verdict {
    /// Numeric form: 0 pending, 1 passed, negative step number on failure
    pub fn code(&self) -> i32 {
        match self {
            Verdict::Pending => 0,
            Verdict::Passed => 1,
            Verdict::Failed(code) => *code,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::Pending)
    }
}

/// Everything a step may consult besides the device
pub struct StepContext<'a> {
    /// Case the table belongs to, for journal entries
    pub case: CaseId,
    pub now_ms: u64,
    /// Operator confirmed on this tick
    pub confirmed: bool,
    pub config: &'a EngineConfig,
    pub journal: &'a mut Journal,
}

/// What a single step asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Hold,
    Advance,
    Fail,
}

/// Position and timer state for one table
#[derive(Debug, Clone, Default)]
pub struct StepMachine {
    index: usize,
    anchor: Option<u64>,
    verdict: Verdict,
    retries: u8,
    prompted: bool,
}

impl StepMachine {
    pub const fn new() -> Self {
        Self {
            index: 0,
            anchor: None,
            verdict: Verdict::Pending,
            retries: 0,
            prompted: false,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Index of the step the next tick executes
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn anchor(&self) -> Option<u64> {
        self.anchor
    }

    /// Execute the current step of `table`
    ///
    /// Reads at most one snapshot and sends at most one command. Once the
    /// verdict is terminal, ticks return it without touching the device.
    pub fn tick<D: Device>(
        &mut self,
        table: &[StepSpec],
        device: &mut D,
        ctx: &mut StepContext<'_>,
    ) -> Verdict {
        if self.verdict.is_terminal() {
            return self.verdict;
        }

        let Some(spec) = table.get(self.index) else {
            self.verdict = Verdict::Passed;
            return self.verdict;
        };

        match self.execute(spec, device, ctx) {
            StepOutcome::Hold => {}
            StepOutcome::Advance => {
                self.index += 1;
                self.retries = 0;
                self.prompted = false;
                if self.index >= table.len() {
                    self.verdict = Verdict::Passed;
                }
            }
            StepOutcome::Fail => {
                self.verdict = Verdict::Failed(spec.failure_code());
            }
        }

        self.verdict
    }

    fn execute<D: Device>(
        &mut self,
        spec: &StepSpec,
        device: &mut D,
        ctx: &mut StepContext<'_>,
    ) -> StepOutcome {
        match spec.step {
            Step::Confirm(action) => self.confirm(action, ctx),

            Step::EstopCue => {
                if ctx.config.family.needs_estop_cycle() {
                    ctx.journal.record(Event::Prompt(OperatorAction::CycleEstop));
                }
                StepOutcome::Advance
            }

            Step::Expect(condition) => {
                if condition.holds(&device.snapshot()) {
                    StepOutcome::Advance
                } else {
                    StepOutcome::Fail
                }
            }

            Step::Send { command, mark } => {
                send(device, ctx, command);
                if mark {
                    self.anchor = Some(ctx.now_ms);
                }
                StepOutcome::Advance
            }

            Step::Settle(span) => {
                let delay = ctx.config.timing.span_ms(span);
                if self.elapsed(ctx.now_ms) >= delay {
                    StepOutcome::Advance
                } else {
                    StepOutcome::Hold
                }
            }

            Step::WaitFor {
                condition,
                timeout,
                then,
            } => {
                let deadline = ctx.config.timing.span_ms(timeout);
                let elapsed = self.elapsed(ctx.now_ms);
                if condition.holds(&device.snapshot()) {
                    ctx.journal.record(Event::Detected(condition));
                    self.anchor = Some(ctx.now_ms);
                    if let Some(command) = then {
                        send(device, ctx, command);
                    }
                    StepOutcome::Advance
                } else if elapsed > deadline {
                    ctx.journal.record(Event::Timeout {
                        case: ctx.case,
                        code: spec.failure_code(),
                    });
                    StepOutcome::Fail
                } else {
                    StepOutcome::Hold
                }
            }

            Step::RetryUntil {
                condition,
                command,
                mark,
            } => {
                if condition.holds(&device.snapshot()) {
                    if mark {
                        self.anchor = Some(ctx.now_ms);
                    }
                    StepOutcome::Advance
                } else if self.retries < ctx.config.retry_limit {
                    self.retries += 1;
                    send(device, ctx, command);
                    StepOutcome::Hold
                } else {
                    StepOutcome::Fail
                }
            }

            Step::PauseOutcome => {
                let snapshot = device.snapshot();
                if ctx.config.family.pause_escalates() {
                    if Condition::Disabled.holds(&snapshot) {
                        StepOutcome::Advance
                    } else {
                        StepOutcome::Fail
                    }
                } else if Condition::Paused.holds(&snapshot) {
                    send(device, ctx, Command::Disable);
                    StepOutcome::Advance
                } else {
                    StepOutcome::Fail
                }
            }
        }
    }

    fn confirm(&mut self, action: OperatorAction, ctx: &mut StepContext<'_>) -> StepOutcome {
        // A confirmation arriving on the prompting tick predates the prompt
        if !self.prompted {
            self.prompted = true;
            ctx.journal.record(Event::Prompt(action));
            return StepOutcome::Hold;
        }
        if ctx.confirmed {
            StepOutcome::Advance
        } else {
            StepOutcome::Hold
        }
    }

    /// Time since the anchor, anchoring now if there is none
    fn elapsed(&mut self, now_ms: u64) -> u64 {
        let anchor = *self.anchor.get_or_insert(now_ms);
        now_ms.saturating_sub(anchor)
    }
}

fn send<D: Device>(device: &mut D, ctx: &mut StepContext<'_>, command: Command) {
    device.send_command(command);
    ctx.journal.record(Event::CommandSent(command));
}
