//! Conformance suite task

use embassy_time::{Duration, Instant, Ticker};
use log::{error, info};

use opstate_core::state::Event;
use opstate_core::suite::SuiteRunner;

use super::{finish, log_event};
use crate::console;
use crate::target::Target;

/// Everything the suite task owns
pub struct SuiteJob {
    pub target: Target,
    pub runner: SuiteRunner,
    pub tick_interval_ms: u64,
    /// Perform operator actions on the simulator instead of waiting
    pub unattended: bool,
}

/// Suite task - ticks the runner until every case has ended
#[embassy_executor::task]
pub async fn suite_task(job: SuiteJob) {
    let SuiteJob {
        mut target,
        mut runner,
        tick_interval_ms,
        unattended,
    } = job;
    info!(
        "Suite task started at case {}",
        runner.config().starting_case
    );

    let mut ticker = Ticker::every(Duration::from_millis(tick_interval_ms));
    let start = Instant::now();
    let mut auto_confirm = false;

    loop {
        ticker.next().await;
        let now_ms = start.elapsed().as_millis();

        if let Err(e) = target.refresh(now_ms) {
            error!("{}", e);
            finish(2);
        }

        let confirmed = console::take_confirm() | core::mem::take(&mut auto_confirm);
        let status = runner.tick(&mut target, now_ms, confirmed);

        while let Some(event) = runner.journal().pop() {
            log_event(&event);
            if let Event::Prompt(action) = event {
                if unattended && target.perform(action) {
                    info!("Performed {:?}", action);
                    auto_confirm |= action.needs_confirmation();
                } else {
                    console::prompt(action);
                }
            }
        }

        if status.finished {
            finish(if status.succeeded() { 0 } else { 1 });
        }
    }
}
