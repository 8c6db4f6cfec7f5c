//! opstate - Operating-State Conformance Runner
//!
//! Runs the eight operating-state cases, or the cube tracing workload,
//! against the simulated robot or a robot adapter reached over TCP. The
//! `serve` mode is that adapter for the simulator, so the framed link can
//! be exercised between two processes.

use std::net::TcpListener;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use embassy_executor::{Executor, Spawner};
use log::{error, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use static_cell::StaticCell;

use opstate_core::config::DeviceFamily;
use opstate_core::cube::CubeTracer;
use opstate_core::suite::SuiteRunner;
use opstate_drivers::{LinkDevice, RobotLink, SimArm, SimArmConfig, SimRobot};

use crate::config::{HostConfig, HostError};
use crate::target::{Target, TcpStream};
use crate::tasks::{CubeJob, ServeJob, SuiteJob};

mod config;
mod console;
mod target;
mod tasks;

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[derive(Debug, Parser)]
#[command(name = "opstate", version, about = "Operating-state conformance runner")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "opstate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run the operating-state cases
    Suite {
        /// Robot adapter address; the simulator is used when absent
        #[arg(long)]
        connect: Option<String>,
        #[arg(long, value_enum)]
        family: Option<Family>,
        /// First case to run (1-8)
        #[arg(long)]
        starting_case: Option<u8>,
        /// Perform prompted actions on the simulator and confirm them
        #[arg(long)]
        unattended: bool,
    },
    /// Trace random cube edges with two simulated arms
    Cube {
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many edges
        #[arg(long)]
        edges: Option<u32>,
        #[arg(long)]
        unattended: bool,
    },
    /// Serve the simulated robot to a host over TCP
    Serve {
        #[arg(long, default_value = "127.0.0.1:7878")]
        listen: String,
        #[arg(long, value_enum)]
        family: Option<Family>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Family {
    Raven,
    Generic,
}

impl From<Family> for DeviceFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::Raven => DeviceFamily::Raven,
            Family::Generic => DeviceFamily::Generic,
        }
    }
}

/// Task to start on the executor
enum Job {
    Suite(SuiteJob),
    Cube(CubeJob),
    Serve(ServeJob),
}

fn main() -> Result<(), HostError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = HostConfig::load(&cli.config)?;
    let job = prepare(cli.mode, &mut config)?;

    console::spawn_reader()?;

    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner| start(spawner, job))
}

/// Apply command-line overrides and build the task state
fn prepare(mode: Mode, config: &mut HostConfig) -> Result<Job, HostError> {
    match mode {
        Mode::Suite {
            connect,
            family,
            starting_case,
            unattended,
        } => {
            if let Some(family) = family {
                config.engine.family = family.into();
            }
            if let Some(case) = starting_case {
                config.engine.starting_case = case;
            }
            config.validate()?;

            let target = match connect {
                Some(addr) => {
                    if unattended {
                        warn!("Unattended mode only applies to the simulator; prompts need an operator");
                    }
                    Target::Link(LinkDevice::new(TcpStream::connect(&addr)?))
                }
                None => {
                    info!("Using the simulated robot ({:?})", config.engine.family);
                    Target::Sim(SimRobot::new(config.sim, config.engine.family))
                }
            };

            Ok(Job::Suite(SuiteJob {
                target,
                runner: SuiteRunner::new(config.engine),
                tick_interval_ms: config.tick_interval_ms,
                unattended,
            }))
        }

        Mode::Cube {
            seed,
            edges,
            unattended,
        } => {
            if let Some(seed) = seed {
                config.seed = seed;
            }
            config.validate()?;

            let arm = SimArmConfig {
                completion_ratio: config.cube.completion_ratio,
                ..config.arm
            };
            info!("Tracing with seed {}", config.seed);
            Ok(Job::Cube(CubeJob {
                robot: SimRobot::new(config.sim, config.engine.family),
                arms: [
                    SimArm::new(arm, config.seed),
                    SimArm::new(arm, config.seed.wrapping_add(1)),
                ],
                tracer: CubeTracer::new(config.cube),
                rng: ChaCha8Rng::seed_from_u64(config.seed),
                tick_interval_ms: config.tick_interval_ms,
                unattended,
                edge_limit: edges,
            }))
        }

        Mode::Serve { listen, family } => {
            if let Some(family) = family {
                config.engine.family = family.into();
            }
            config.validate()?;

            let listener = TcpListener::bind(&listen)?;
            info!("Waiting for a host on {}", listener.local_addr()?);
            let (stream, _) = listener.accept()?;
            let stream = TcpStream::new(stream)?;
            info!("Host connected from {}", stream.peer_addr()?);
            info!("Type home, busy, pause, restart or estop to act on the robot");

            Ok(Job::Serve(ServeJob {
                robot: SimRobot::new(config.sim, config.engine.family),
                link: RobotLink::new(stream),
                tick_interval_ms: config.tick_interval_ms,
            }))
        }
    }
}

fn start(spawner: Spawner, job: Job) {
    let spawned = match job {
        Job::Suite(job) => spawner.spawn(tasks::suite_task(job)),
        Job::Cube(job) => spawner.spawn(tasks::cube_task(job)),
        Job::Serve(job) => spawner.spawn(tasks::serve_task(job)),
    };
    if let Err(e) = spawned {
        error!("Failed to start task: {:?}", e);
        tasks::finish(2);
    }
}
