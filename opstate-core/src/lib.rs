//! Device-agnostic conformance engine
//!
//! This crate contains all test logic that does not depend on a specific
//! robot, transport, or clock:
//!
//! - Device and arm traits (what the engine observes and commands)
//! - Operating-state vocabulary and the event journal
//! - Resumable step machine and step tables
//! - The eight operating-state test cases and the suite runner
//! - Cube-edge path generator and tracing loop
//! - Configuration type definitions
//!
//! Everything is driven by `tick` calls from an external polling loop.
//! Nothing in here blocks or reads a clock; time is passed in as
//! milliseconds.

#![no_std]
#![deny(unsafe_code)]

pub mod cases;
pub mod config;
pub mod cube;
pub mod state;
pub mod step;
pub mod suite;
pub mod traits;
