//! Table-driven step execution
//!
//! Scenarios are written as static step tables and interpreted one step per
//! tick by a [`StepMachine`].

pub mod machine;
pub mod table;

pub use machine::{StepContext, StepMachine, Verdict};
pub use table::{Step, StepSpec};
