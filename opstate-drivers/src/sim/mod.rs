//! Simulated robot and arms
//!
//! Stand-ins for real hardware so the suite and the cube tracer can run
//! without a robot attached.

pub mod arm;
pub mod robot;

pub use arm::{SimArm, SimArmConfig};
pub use robot::{SimRobot, SimTiming};
