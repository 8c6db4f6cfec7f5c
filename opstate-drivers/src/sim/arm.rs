//! Simulated motion arm
//!
//! Follows relative moves along a straight line at constant speed. The arm
//! trails the commanded position slightly; a move is complete once its time
//! is up and it has covered the completion ratio of the distance. Failures
//! are injected per move from a seeded generator so runs are reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use opstate_core::traits::{MotionArm, MotionStatus};

/// Simulated arm behavior
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimArmConfig {
    /// Fraction of the commanded travel the arm actually achieves
    pub tracking: f32,
    /// Fraction of the distance that counts as arrived
    pub completion_ratio: f32,
    /// Probability that a move fails partway (0.0 to 1.0)
    pub failure_rate: f32,
}

impl Default for SimArmConfig {
    fn default() -> Self {
        Self {
            tracking: 0.98,
            completion_ratio: 0.85,
            failure_rate: 0.0,
        }
    }
}

/// Move in flight
#[derive(Debug, Clone, Copy)]
struct Motion {
    started_ms: u64,
    origin: [f32; 3],
    /// Fails once half the duration has passed
    doomed: bool,
}

/// One simulated arm
#[derive(Debug)]
pub struct SimArm {
    config: SimArmConfig,
    rng: ChaCha8Rng,
    position: [f32; 3],
    motion: Option<Motion>,
    moves: u32,
    failures: u32,
}

impl SimArm {
    pub fn new(config: SimArmConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            position: [0.0; 3],
            motion: None,
            moves: 0,
            failures: 0,
        }
    }

    /// Current tool position relative to where the arm started, in meters
    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    /// Moves started so far
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Moves that failed so far
    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn should_fail(&mut self) -> bool {
        let rate = self.config.failure_rate;
        if rate <= 0.0 {
            return false;
        }
        if rate >= 1.0 {
            return true;
        }
        self.rng.gen::<f32>() < rate
    }

    fn begin(&mut self, now_ms: u64) -> Motion {
        let doomed = self.should_fail();
        self.moves = self.moves.wrapping_add(1);
        let motion = Motion {
            started_ms: now_ms,
            origin: self.position,
            doomed,
        };
        self.motion = Some(motion);
        motion
    }
}

impl MotionArm for SimArm {
    fn start_motion(&mut self, now_ms: u64) {
        self.begin(now_ms);
    }

    fn servo_relative(
        &mut self,
        direction: [f32; 3],
        distance_m: f32,
        duration_ms: u32,
        now_ms: u64,
    ) -> MotionStatus {
        let motion = match self.motion {
            Some(motion) => motion,
            None => self.begin(now_ms),
        };

        let elapsed = now_ms.saturating_sub(motion.started_ms);
        let duration = duration_ms.max(1) as u64;

        if motion.doomed && elapsed * 2 >= duration {
            self.failures = self.failures.wrapping_add(1);
            self.motion = None;
            return MotionStatus::Failed;
        }

        let fraction = (elapsed as f32 / duration as f32).min(1.0);
        let travelled = distance_m * fraction * self.config.tracking;
        for (axis, origin) in motion.origin.iter().enumerate() {
            self.position[axis] = origin + direction[axis] * travelled;
        }

        if elapsed < duration {
            return MotionStatus::InProgress;
        }
        if travelled >= distance_m * self.config.completion_ratio {
            self.motion = None;
            MotionStatus::Complete
        } else if elapsed >= duration * 2 {
            // Never going to get there
            self.failures = self.failures.wrapping_add(1);
            self.motion = None;
            MotionStatus::Failed
        } else {
            MotionStatus::InProgress
        }
    }

    fn hold(&mut self) {
        self.motion = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWN: [f32; 3] = [0.0, 0.0, -1.0];

    #[test]
    fn test_move_completes_after_duration() {
        let mut arm = SimArm::new(SimArmConfig::default(), 1);
        arm.start_motion(0);

        assert_eq!(arm.servo_relative(DOWN, 0.01, 1_000, 500), MotionStatus::InProgress);
        assert!((arm.position()[2] + 0.0049).abs() < 1e-6);

        assert_eq!(arm.servo_relative(DOWN, 0.01, 1_000, 1_000), MotionStatus::Complete);
        assert!((arm.position()[2] + 0.0098).abs() < 1e-6);
        assert_eq!(arm.moves(), 1);
    }

    #[test]
    fn test_next_move_starts_from_reached_position() {
        let mut arm = SimArm::new(SimArmConfig::default(), 1);
        arm.start_motion(0);
        arm.servo_relative(DOWN, 0.01, 1_000, 1_000);

        arm.start_motion(1_000);
        arm.servo_relative([1.0, 0.0, 0.0], 0.01, 1_000, 2_000);
        let position = arm.position();
        assert!((position[0] - 0.0098).abs() < 1e-6);
        assert!((position[2] + 0.0098).abs() < 1e-6);
    }

    #[test]
    fn test_poor_tracking_fails() {
        let config = SimArmConfig {
            tracking: 0.5,
            ..Default::default()
        };
        let mut arm = SimArm::new(config, 1);
        arm.start_motion(0);
        assert_eq!(arm.servo_relative(DOWN, 0.01, 100, 100), MotionStatus::InProgress);
        assert_eq!(arm.servo_relative(DOWN, 0.01, 100, 200), MotionStatus::Failed);
        assert_eq!(arm.failures(), 1);
    }

    #[test]
    fn test_certain_failure() {
        let config = SimArmConfig {
            failure_rate: 1.0,
            ..Default::default()
        };
        let mut arm = SimArm::new(config, 1);
        arm.start_motion(0);
        assert_eq!(arm.servo_relative(DOWN, 0.01, 1_000, 100), MotionStatus::InProgress);
        assert_eq!(arm.servo_relative(DOWN, 0.01, 1_000, 500), MotionStatus::Failed);
    }

    #[test]
    fn test_failures_reproducible_by_seed() {
        let config = SimArmConfig {
            failure_rate: 0.3,
            ..Default::default()
        };
        let outcomes = |seed| {
            let mut arm = SimArm::new(config, seed);
            let mut failed = [false; 32];
            for (i, slot) in failed.iter_mut().enumerate() {
                let start = i as u64 * 10_000;
                arm.start_motion(start);
                *slot = arm.servo_relative(DOWN, 0.01, 1_000, start + 1_000) == MotionStatus::Failed;
            }
            failed
        };
        assert_eq!(outcomes(5), outcomes(5));
        assert!(outcomes(5).iter().any(|f| *f));
    }

    #[test]
    fn test_hold_stops_motion() {
        let mut arm = SimArm::new(SimArmConfig::default(), 1);
        arm.start_motion(0);
        arm.servo_relative(DOWN, 0.01, 1_000, 500);
        arm.hold();
        let held = arm.position();

        // A new move starts from where the arm was held
        arm.servo_relative(DOWN, 0.01, 1_000, 600);
        assert_eq!(arm.position(), held);
        assert_eq!(arm.moves(), 2);
    }
}
