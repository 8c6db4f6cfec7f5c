//! Cube tracing loop
//!
//! Brings the robot up, lowers both arms onto the cube and then has each
//! arm trace random edges forever. Completion of a move is judged by the
//! arm itself (elapsed time and distance travelled).

use rand::Rng;

use super::walk::{next_heading, CubeWalk};
use super::{ArmId, Heading};
use crate::config::CubeConfig;
use crate::state::{Command, Event, Journal, OperatorAction};
use crate::traits::{Device, MotionArm, MotionStatus};

/// Tracer progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TracePhase {
    /// Asking the operator to start and home the robot
    Prompting,
    /// Waiting for the operator
    AwaitingConfirm,
    /// Confirmed; resume goes out next
    Resuming,
    /// Moving one arm down onto the cube
    Lowering(ArmId),
    /// Walking cube edges
    Tracing,
}

/// Result of one tracer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TraceStatus {
    Running,
    /// Lowering move failed this tick and will be retried
    LoweringFailed(ArmId),
}

impl TraceStatus {
    /// 0 while running, negative while lowering fails
    pub fn code(&self) -> i32 {
        match self {
            TraceStatus::Running => 0,
            TraceStatus::LoweringFailed(ArmId::Left) => -4,
            TraceStatus::LoweringFailed(ArmId::Right) => -5,
        }
    }
}

/// Per-arm edge state
#[derive(Debug, Clone, Copy)]
struct ArmTrack {
    walk: CubeWalk,
    /// Edge in flight
    edge: Option<Heading>,
    /// Move must be restarted before the next servo call
    restart: bool,
}

/// Two-arm cube tracer
#[derive(Debug)]
pub struct CubeTracer {
    config: CubeConfig,
    phase: TracePhase,
    tracks: [ArmTrack; 2],
    edges: u32,
    journal: Journal,
}

impl CubeTracer {
    pub fn new(config: CubeConfig) -> Self {
        let track = ArmTrack {
            walk: CubeWalk::from_config(&config),
            edge: None,
            restart: false,
        };
        Self {
            config,
            phase: TracePhase::Prompting,
            tracks: [track; 2],
            edges: 0,
            journal: Journal::new(),
        }
    }

    pub fn phase(&self) -> TracePhase {
        self.phase
    }

    /// Edges started by both arms since tracing began
    pub fn edges(&self) -> u32 {
        self.edges
    }

    pub fn walk(&self, arm: ArmId) -> &CubeWalk {
        &self.tracks[arm.index()].walk
    }

    pub fn journal(&mut self) -> &mut Journal {
        &mut self.journal
    }

    /// Advance the tracer by one tick
    pub fn tick<D, A, R>(
        &mut self,
        device: &mut D,
        arms: &mut [A; 2],
        now_ms: u64,
        confirmed: bool,
        rng: &mut R,
    ) -> TraceStatus
    where
        D: Device,
        A: MotionArm,
        R: Rng + ?Sized,
    {
        match self.phase {
            TracePhase::Prompting => {
                self.journal.record(Event::Prompt(OperatorAction::StartTracing));
                self.phase = TracePhase::AwaitingConfirm;
            }

            TracePhase::AwaitingConfirm => {
                if confirmed {
                    self.phase = TracePhase::Resuming;
                }
            }

            TracePhase::Resuming => {
                device.send_command(Command::Resume);
                self.journal.record(Event::CommandSent(Command::Resume));
                arms[ArmId::Left.index()].start_motion(now_ms);
                self.phase = TracePhase::Lowering(ArmId::Left);
            }

            TracePhase::Lowering(arm) => {
                if !device.snapshot().is_enabled() {
                    return TraceStatus::Running;
                }
                return self.lower(arm, arms, now_ms);
            }

            TracePhase::Tracing => {
                for arm in ArmId::BOTH {
                    self.trace(arm, &mut arms[arm.index()], now_ms, rng);
                }
            }
        }

        TraceStatus::Running
    }

    fn lower<A: MotionArm>(&mut self, arm: ArmId, arms: &mut [A; 2], now_ms: u64) -> TraceStatus {
        let track = &mut self.tracks[arm.index()];
        let motion = &mut arms[arm.index()];
        if track.restart {
            motion.start_motion(now_ms);
            track.restart = false;
        }

        let status = motion.servo_relative(
            Heading::DOWN.vector(),
            self.config.edge_length_m,
            self.config.edge_duration_ms,
            now_ms,
        );

        match status {
            MotionStatus::InProgress => TraceStatus::Running,
            MotionStatus::Complete => {
                self.journal.record(Event::ArmLowered(arm));
                match arm {
                    ArmId::Left => {
                        arms[ArmId::Right.index()].start_motion(now_ms);
                        self.phase = TracePhase::Lowering(ArmId::Right);
                    }
                    ArmId::Right => self.phase = TracePhase::Tracing,
                }
                TraceStatus::Running
            }
            MotionStatus::Failed => {
                motion.hold();
                track.restart = true;
                self.journal.record(Event::MoveFailed(arm));
                TraceStatus::LoweringFailed(arm)
            }
        }
    }

    fn trace<A, R>(&mut self, arm: ArmId, motion: &mut A, now_ms: u64, rng: &mut R)
    where
        A: MotionArm,
        R: Rng + ?Sized,
    {
        let track = &mut self.tracks[arm.index()];

        let heading = match track.edge {
            Some(heading) if track.restart => {
                motion.start_motion(now_ms);
                track.restart = false;
                heading
            }
            Some(heading) => heading,
            None => {
                let heading = next_heading(&mut track.walk, rng);
                motion.start_motion(now_ms);
                track.edge = Some(heading);
                self.edges = self.edges.wrapping_add(1);
                self.journal.record(Event::EdgeStarted { arm, heading });
                heading
            }
        };

        let status = motion.servo_relative(
            heading.vector(),
            self.config.edge_length_m,
            self.config.edge_duration_ms,
            now_ms,
        );

        match status {
            MotionStatus::InProgress => {}
            MotionStatus::Complete => track.edge = None,
            MotionStatus::Failed => {
                motion.hold();
                track.restart = true;
                self.journal.record(Event::MoveFailed(arm));
            }
        }
    }
}
