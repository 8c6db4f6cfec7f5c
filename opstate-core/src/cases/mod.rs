//! Operating-state test cases
//!
//! Each case pairs a static step table with the [`StepMachine`] that walks
//! it. Cases are run in order by the suite runner and never restarted.

pub mod tables;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::state::{Event, Journal};
use crate::step::{StepContext, StepMachine, StepSpec, Verdict};
use crate::traits::Device;

/// Number of cases in the suite
pub const CASE_COUNT: usize = 8;

/// 1-based case number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaseId(u8);

impl CaseId {
    pub const FIRST: CaseId = CaseId(1);

    /// Create a case id, clamped to `1..=CASE_COUNT`
    pub const fn new(number: u8) -> Self {
        if number == 0 {
            CaseId(1)
        } else if number as usize > CASE_COUNT {
            CaseId(CASE_COUNT as u8)
        } else {
            CaseId(number)
        }
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// The case after this one, if any
    pub fn next(&self) -> Option<CaseId> {
        if (self.0 as usize) < CASE_COUNT {
            Some(CaseId(self.0 + 1))
        } else {
            None
        }
    }

    /// Step table for this case
    pub fn table(&self) -> &'static [StepSpec] {
        match self.0 {
            1 => &tables::CASE_1,
            2 => &tables::CASE_2,
            3 => &tables::CASE_3,
            4 => &tables::CASE_4,
            5 => &tables::CASE_5,
            6 => &tables::CASE_6,
            7 => &tables::CASE_7,
            _ => &tables::CASE_8,
        }
    }

    /// Short description of the transition under test
    pub fn title(&self) -> &'static str {
        match self.0 {
            1 => "{disabled, not homed} + enable -> {enabled}",
            2 => "{paused, homed} + resume -> {enabled}; {enabled, busy} + pause -> {paused}",
            3 => "{paused} + disable -> {disabled}; {disabled, homed} + unhome -> {not homed}",
            4 => "{enabled, homing} + pause -> {paused}",
            5 => "{enabled, homing} + disable -> {disabled}",
            6 => "{enabled, homing} + unhome -> {disabled, not homed}",
            7 => "{paused, homed} + unhome -> {disabled, not homed}",
            _ => "home from {disabled}, {paused, homed} and {enabled, homed}",
        }
    }
}

/// One scenario and its progress
#[derive(Debug, Clone)]
pub struct TestCase {
    id: CaseId,
    machine: StepMachine,
}

impl TestCase {
    pub const fn new(id: CaseId) -> Self {
        Self {
            id,
            machine: StepMachine::new(),
        }
    }

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn verdict(&self) -> Verdict {
        self.machine.verdict()
    }

    /// Run one step, journaling the verdict when the case ends
    pub fn tick<D: Device>(
        &mut self,
        device: &mut D,
        now_ms: u64,
        confirmed: bool,
        config: &EngineConfig,
        journal: &mut Journal,
    ) -> Verdict {
        let was_terminal = self.machine.verdict().is_terminal();
        let mut ctx = StepContext {
            case: self.id,
            now_ms,
            confirmed,
            config,
            journal,
        };
        let verdict = self.machine.tick(self.id.table(), device, &mut ctx);

        if !was_terminal {
            match verdict {
                Verdict::Passed => ctx.journal.record(Event::CasePassed(self.id)),
                Verdict::Failed(code) => ctx.journal.record(Event::CaseFailed {
                    case: self.id,
                    code,
                }),
                Verdict::Pending => {}
            }
        }

        verdict
    }
}
