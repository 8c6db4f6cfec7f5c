//! Embassy polling tasks
//!
//! Each mode runs as one task paced by a `Ticker`. After every tick the
//! task drains the engine journal into the log.

pub mod cube;
pub mod serve;
pub mod suite;

pub use cube::{cube_task, CubeJob};
pub use serve::{serve_task, ServeJob};
pub use suite::{suite_task, SuiteJob};

use log::{debug, error, info, warn};

use opstate_core::state::Event;

/// Log one journal entry
pub fn log_event(event: &Event) {
    match *event {
        Event::LinkUp => info!("Robot link up, settling"),
        Event::AwaitingLink => warn!("Robot not connected yet, waiting"),
        Event::CaseStarted(id) => info!("Case {}: {}", id.number(), id.title()),
        Event::Prompt(action) => debug!("Prompted: {:?}", action),
        Event::CommandSent(command) => debug!("Sent {}", command.name()),
        Event::Detected(condition) => info!("{:?} detected", condition),
        Event::Timeout { case, code } => {
            warn!("Case {}: timed out at step {}", case.number(), -code)
        }
        Event::CasePassed(id) => info!("Case {} passed", id.number()),
        Event::CaseFailed { case, code } => {
            error!("Case {} failed with code {}", case.number(), code)
        }
        Event::SuiteFinished { errors: 0 } => info!("All cases passed"),
        Event::SuiteFinished { errors } => error!("{} case(s) failed", errors),
        Event::ArmLowered(arm) => info!("{:?} arm on the cube", arm),
        Event::EdgeStarted { arm, heading } => debug!(
            "{:?} arm: {}{:?}",
            arm,
            if heading.positive { '+' } else { '-' },
            heading.axis
        ),
        Event::MoveFailed(arm) => warn!("{:?} arm move failed, restarting edge", arm),
    }
}

/// Exit the process once a task is done
pub fn finish(code: i32) -> ! {
    log::logger().flush();
    std::process::exit(code)
}
