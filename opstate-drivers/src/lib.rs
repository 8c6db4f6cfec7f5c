//! Device implementations
//!
//! Concrete implementations of the traits defined in opstate-core:
//!
//! - Simulated robot with a latency-modelled operating-state machine
//! - Simulated arms for the cube tracing workload
//! - Framed link to a real robot adapter over any `embedded-io` stream

#![no_std]
#![deny(unsafe_code)]

pub mod link;
pub mod sim;

pub use link::{LinkDevice, LinkError, RobotLink};
pub use sim::{SimArm, SimArmConfig, SimRobot, SimTiming};
