//! Device abstraction traits
//!
//! These traits define the interface between the test engine and whatever
//! actually talks to the robot (a simulator, a framed link, a middleware
//! bridge).

pub mod arm;
pub mod device;

pub use arm::{MotionArm, MotionStatus};
pub use device::Device;
