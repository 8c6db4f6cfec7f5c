//! Suite runner
//!
//! Waits for the device link, lets it settle, then runs the cases in order.
//! A failing case counts as an error and the suite moves on. Once the last
//! case is done the robot is disabled exactly once.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cases::{CaseId, TestCase};
use crate::config::EngineConfig;
use crate::state::{Command, Event, Journal};
use crate::step::Verdict;
use crate::traits::Device;

/// Runner phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SuitePhase {
    /// No connected snapshot seen yet
    AwaitingLink,
    /// Link is up; grace period running since `since_ms`
    Settling { since_ms: u64 },
    /// A case is active
    Running(CaseId),
    /// Every case has ended
    Finished,
}

/// Summary returned from every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuiteStatus {
    /// Number of failed cases so far
    pub errors: u8,
    /// The safing command has been sent
    pub finished: bool,
}

impl SuiteStatus {
    /// Finished with no failed case
    pub fn succeeded(&self) -> bool {
        self.finished && self.errors == 0
    }
}

/// Sequential runner over the eight cases
#[derive(Debug)]
pub struct SuiteRunner {
    config: EngineConfig,
    phase: SuitePhase,
    case: TestCase,
    errors: u8,
    finished: bool,
    /// Time of the first tick, for the not-connected notice
    first_tick_ms: Option<u64>,
    link_notice_sent: bool,
    journal: Journal,
}

impl SuiteRunner {
    pub fn new(config: EngineConfig) -> Self {
        let start = CaseId::new(config.starting_case);
        Self {
            config,
            phase: SuitePhase::AwaitingLink,
            case: TestCase::new(start),
            errors: 0,
            finished: false,
            first_tick_ms: None,
            link_notice_sent: false,
            journal: Journal::new(),
        }
    }

    pub fn phase(&self) -> SuitePhase {
        self.phase
    }

    pub fn status(&self) -> SuiteStatus {
        SuiteStatus {
            errors: self.errors,
            finished: self.finished,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Events recorded since the last drain
    pub fn journal(&mut self) -> &mut Journal {
        &mut self.journal
    }

    /// Advance the suite by one tick
    pub fn tick<D: Device>(&mut self, device: &mut D, now_ms: u64, confirmed: bool) -> SuiteStatus {
        let first_tick = *self.first_tick_ms.get_or_insert(now_ms);

        match self.phase {
            SuitePhase::AwaitingLink => {
                if device.snapshot().connected {
                    self.journal.record(Event::LinkUp);
                    self.phase = SuitePhase::Settling { since_ms: now_ms };
                } else if !self.link_notice_sent
                    && now_ms.saturating_sub(first_tick) >= self.config.timing.link_settle_ms as u64
                {
                    self.link_notice_sent = true;
                    self.journal.record(Event::AwaitingLink);
                }
            }

            SuitePhase::Settling { since_ms } => {
                if now_ms.saturating_sub(since_ms) >= self.config.timing.link_settle_ms as u64 {
                    let id = self.case.id();
                    self.journal.record(Event::CaseStarted(id));
                    self.phase = SuitePhase::Running(id);
                    self.run_case(device, now_ms, confirmed);
                }
            }

            SuitePhase::Running(_) => self.run_case(device, now_ms, confirmed),

            SuitePhase::Finished => {
                if !self.finished {
                    device.send_command(Command::Disable);
                    self.journal.record(Event::CommandSent(Command::Disable));
                    self.finished = true;
                    self.journal.record(Event::SuiteFinished {
                        errors: self.errors,
                    });
                }
            }
        }

        self.status()
    }

    fn run_case<D: Device>(&mut self, device: &mut D, now_ms: u64, confirmed: bool) {
        let verdict = self
            .case
            .tick(device, now_ms, confirmed, &self.config, &mut self.journal);

        match verdict {
            Verdict::Pending => return,
            Verdict::Failed(_) => self.errors = self.errors.saturating_add(1),
            Verdict::Passed => {}
        }

        match self.case.id().next() {
            Some(next) => {
                self.case = TestCase::new(next);
                self.journal.record(Event::CaseStarted(next));
                self.phase = SuitePhase::Running(next);
            }
            None => self.phase = SuitePhase::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DeviceSnapshot, OperatingState};
    use crate::traits::device::mock::MockDevice;

    fn offline() -> DeviceSnapshot {
        DeviceSnapshot {
            connected: false,
            ..DeviceSnapshot::powered_up()
        }
    }

    fn drain(runner: &mut SuiteRunner) -> heapless::Vec<Event, 64> {
        let mut events = heapless::Vec::new();
        while let Some(event) = runner.journal().pop() {
            let _ = events.push(event);
        }
        events
    }

    #[test]
    fn test_noop_until_connected() {
        let mut runner = SuiteRunner::new(EngineConfig::default());
        let mut device = MockDevice::new(offline());

        for now in (0..5_000).step_by(100) {
            let status = runner.tick(&mut device, now, true);
            assert_eq!(status, SuiteStatus::default());
        }
        assert!(device.sent.is_empty());
        assert_eq!(runner.phase(), SuitePhase::AwaitingLink);

        // The not-connected notice is given once
        let events = drain(&mut runner);
        assert_eq!(events.as_slice(), &[Event::AwaitingLink]);
    }

    #[test]
    fn test_settle_anchored_at_first_contact() {
        let mut runner = SuiteRunner::new(EngineConfig::default());
        let mut device = MockDevice::new(offline());

        runner.tick(&mut device, 0, false);
        device.snapshot.connected = true;
        runner.tick(&mut device, 3_000, false);
        assert_eq!(runner.phase(), SuitePhase::Settling { since_ms: 3_000 });

        runner.tick(&mut device, 4_999, false);
        assert!(matches!(runner.phase(), SuitePhase::Settling { .. }));

        runner.tick(&mut device, 5_000, false);
        assert_eq!(runner.phase(), SuitePhase::Running(CaseId::new(1)));
    }

    #[test]
    fn test_case_1_failure_counted_before_case_2() {
        let mut runner = SuiteRunner::new(EngineConfig::default());
        let mut device = MockDevice::new(DeviceSnapshot::powered_up());

        let mut now = 0;
        while runner.phase() != SuitePhase::Running(CaseId::new(2)) {
            let status = runner.tick(&mut device, now, false);
            if runner.phase() == SuitePhase::Running(CaseId::new(1)) {
                assert_eq!(status.errors, 0);
            }
            now += 100;
        }

        assert_eq!(runner.status().errors, 1);
        assert_eq!(device.sent.as_slice(), &[Command::Enable, Command::Home]);
        let events = drain(&mut runner);
        assert!(events.contains(&Event::CaseFailed {
            case: CaseId::new(1),
            code: -6
        }));
        assert_eq!(events.last(), Some(&Event::CaseStarted(CaseId::new(2))));
    }

    #[test]
    fn test_case_1_passes_when_device_enables() {
        let mut runner = SuiteRunner::new(EngineConfig::default());
        let mut device = MockDevice::new(DeviceSnapshot::powered_up());

        let mut now = 0;
        while runner.phase() != SuitePhase::Running(CaseId::new(2)) {
            runner.tick(&mut device, now, false);
            if device.count(Command::Enable) > 0 {
                device.snapshot.state = OperatingState::Enabled;
            }
            now += 100;
        }

        assert_eq!(runner.status().errors, 0);
        assert!(drain(&mut runner).contains(&Event::CasePassed(CaseId::new(1))));
    }

    #[test]
    fn test_every_failure_counted_and_one_disable() {
        let mut runner = SuiteRunner::new(EngineConfig::default());
        let mut device = MockDevice::new(DeviceSnapshot::powered_up());

        let mut now = 0;
        let mut status = SuiteStatus::default();
        while !status.finished {
            status = runner.tick(&mut device, now, true);
            while runner.journal().pop().is_some() {}
            now += 100;
            assert!(now < 1_000_000, "suite did not finish");
        }

        // A static disabled robot fails every case
        assert_eq!(status.errors, 8);
        assert!(!status.succeeded());
        assert_eq!(device.count(Command::Disable), 1);

        for _ in 0..10 {
            let after = runner.tick(&mut device, now, true);
            assert_eq!(after, status);
            now += 100;
        }
        assert_eq!(device.count(Command::Disable), 1);
    }

    #[test]
    fn test_starting_case_skips_ahead() {
        let config = EngineConfig {
            starting_case: 8,
            ..Default::default()
        };
        let mut runner = SuiteRunner::new(config);
        let mut device = MockDevice::new(DeviceSnapshot::powered_up());

        runner.tick(&mut device, 0, false);
        runner.tick(&mut device, 2_000, false);
        assert_eq!(runner.phase(), SuitePhase::Running(CaseId::new(8)));
    }
}
