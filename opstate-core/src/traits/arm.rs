//! Motion arm trait
//!
//! Relative Cartesian moves used by the cube tracing workload. A move is
//! started once and then polled every tick with the same arguments until
//! the arm reports it complete or failed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Progress of the move in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotionStatus {
    /// Still travelling
    InProgress,
    /// Target reached
    Complete,
    /// The arm refused or abandoned the move
    Failed,
}

impl MotionStatus {
    /// Check if the move has ended either way
    pub fn is_finished(&self) -> bool {
        !matches!(self, MotionStatus::InProgress)
    }
}

/// A robot arm accepting relative Cartesian moves
pub trait MotionArm {
    /// Mark the start of a new move at `now_ms`
    fn start_motion(&mut self, now_ms: u64);

    /// Move along the unit `direction` by `distance_m` spread over
    /// `duration_ms`, measured from the last `start_motion`
    ///
    /// Called once per tick while the move is in progress.
    fn servo_relative(
        &mut self,
        direction: [f32; 3],
        distance_m: f32,
        duration_ms: u32,
        now_ms: u64,
    ) -> MotionStatus;

    /// Send a zero (identity) relative move so the arm holds still
    fn hold(&mut self);
}

impl<A: MotionArm + ?Sized> MotionArm for &mut A {
    fn start_motion(&mut self, now_ms: u64) {
        (**self).start_motion(now_ms)
    }

    fn servo_relative(
        &mut self,
        direction: [f32; 3],
        distance_m: f32,
        duration_ms: u32,
        now_ms: u64,
    ) -> MotionStatus {
        (**self).servo_relative(direction, distance_m, duration_ms, now_ms)
    }

    fn hold(&mut self) {
        (**self).hold()
    }
}
