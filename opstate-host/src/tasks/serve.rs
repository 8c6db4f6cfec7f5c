//! Robot-side task
//!
//! Runs the simulated robot behind the framed link: applies commands from
//! the host, performs actions typed at the console and streams status.

use embassy_time::{Duration, Instant, Ticker};
use log::{debug, error, info, warn};

use opstate_core::traits::Device;
use opstate_drivers::{LinkError, RobotLink, SimRobot};

use super::finish;
use crate::console::ACTIONS;
use crate::target::TcpStream;

/// Everything the serve task owns
pub struct ServeJob {
    pub robot: SimRobot,
    pub link: RobotLink<TcpStream>,
    pub tick_interval_ms: u64,
}

/// Serve task - keeps the host's view of the robot current
#[embassy_executor::task]
pub async fn serve_task(job: ServeJob) {
    let ServeJob {
        mut robot,
        mut link,
        tick_interval_ms,
    } = job;
    info!("Serve task started");

    let mut ticker = Ticker::every(Duration::from_millis(tick_interval_ms));
    let start = Instant::now();
    let mut last = None;

    loop {
        ticker.next().await;
        let now_ms = start.elapsed().as_millis();

        loop {
            match link.poll_command() {
                Ok(Some(command)) => {
                    debug!("Host sent {}", command.name());
                    robot.send_command(command);
                }
                Ok(None) => break,
                Err(LinkError::Io(kind)) => {
                    error!("Host link closed: {:?}", kind);
                    finish(2);
                }
                Err(e) => warn!("Discarding message from host: {:?}", e),
            }
        }

        while let Ok(action) = ACTIONS.try_receive() {
            info!("Performing {:?}", action);
            robot.perform(action);
        }

        robot.advance(now_ms);
        let snapshot = robot.snapshot();

        if last != Some(snapshot) {
            info!(
                "Robot {} homed={} homing={} busy={} estop={}",
                snapshot.state.code(),
                snapshot.homed,
                snapshot.homing,
                snapshot.busy,
                snapshot.estopped
            );
            last = Some(snapshot);
        }

        if !snapshot.connected {
            continue;
        }
        if let Err(e) = link.publish(&snapshot) {
            error!("Failed to publish status: {:?}", e);
            finish(2);
        }
    }
}
