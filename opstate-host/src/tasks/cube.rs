//! Cube tracing task

use embassy_time::{Duration, Instant, Ticker};
use log::{info, warn};
use rand_chacha::ChaCha8Rng;

use opstate_core::cube::{CubeTracer, TraceStatus};
use opstate_core::state::Event;
use opstate_drivers::{SimArm, SimRobot};

use super::{finish, log_event};
use crate::console;

/// Everything the cube task owns
pub struct CubeJob {
    pub robot: SimRobot,
    pub arms: [SimArm; 2],
    pub tracer: CubeTracer,
    pub rng: ChaCha8Rng,
    pub tick_interval_ms: u64,
    pub unattended: bool,
    /// Stop after this many edges
    pub edge_limit: Option<u32>,
}

/// Cube task - traces edges until the limit, or forever
#[embassy_executor::task]
pub async fn cube_task(job: CubeJob) {
    let CubeJob {
        mut robot,
        mut arms,
        mut tracer,
        mut rng,
        tick_interval_ms,
        unattended,
        edge_limit,
    } = job;
    info!("Cube task started");

    let mut ticker = Ticker::every(Duration::from_millis(tick_interval_ms));
    let start = Instant::now();
    let mut auto_confirm = false;
    let mut failing = false;

    loop {
        ticker.next().await;
        let now_ms = start.elapsed().as_millis();
        robot.advance(now_ms);

        let confirmed = console::take_confirm() | core::mem::take(&mut auto_confirm);
        let status = tracer.tick(&mut robot, &mut arms, now_ms, confirmed, &mut rng);

        // Report lowering trouble once per run of failures
        match status {
            TraceStatus::LoweringFailed(arm) if !failing => {
                warn!("Lowering {:?} arm failed (code {})", arm, status.code());
                failing = true;
            }
            TraceStatus::Running => failing = false,
            _ => {}
        }

        while let Some(event) = tracer.journal().pop() {
            log_event(&event);
            if let Event::Prompt(action) = event {
                if unattended {
                    robot.perform(action);
                    auto_confirm |= action.needs_confirmation();
                } else {
                    console::prompt(action);
                }
            }
        }

        if matches!(edge_limit, Some(limit) if tracer.edges() >= limit) {
            info!(
                "Traced {} edges ({} failed moves)",
                tracer.edges(),
                arms.iter().map(SimArm::failures).sum::<u32>()
            );
            finish(0);
        }
    }
}
