//! Host configuration
//!
//! Read from a TOML file. A missing file means defaults; every table and
//! field in the file is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;

use opstate_core::config::{ConfigError, CubeConfig, EngineConfig};
use opstate_drivers::{LinkError, SimArmConfig, SimTiming};

/// Host errors
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to read {path}: {source}")]
    ReadConfig { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0:?}")]
    InvalidConfig(ConfigError),

    #[error("tick interval must be non-zero")]
    ZeroTickInterval,

    #[error("network error: {0}")]
    Io(#[from] io::Error),

    #[error("robot link failed: {0:?}")]
    Link(LinkError),
}

impl From<ConfigError> for HostError {
    fn from(e: ConfigError) -> Self {
        HostError::InvalidConfig(e)
    }
}

impl From<LinkError> for HostError {
    fn from(e: LinkError) -> Self {
        HostError::Link(e)
    }
}

/// Everything the host reads from `opstate.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Period of the polling loops
    pub tick_interval_ms: u64,
    /// Seed for the cube walk and simulated arm failures
    pub seed: u64,
    pub engine: EngineConfig,
    pub cube: CubeConfig,
    /// Simulated robot response times
    pub sim: SimTiming,
    /// Simulated arm behavior
    pub arm: SimArmConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            seed: 1,
            engine: EngineConfig::default(),
            cube: CubeConfig::default(),
            sim: SimTiming::default(),
            arm: SimArmConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load from `path`, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("{} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(HostError::ReadConfig {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::parse(&text).map_err(|source| HostError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Check the values the engine relies on
    pub fn validate(&self) -> Result<(), HostError> {
        if self.tick_interval_ms == 0 {
            return Err(HostError::ZeroTickInterval);
        }
        self.engine.validate()?;
        self.cube.validate()?;

        let retry_budget = self.engine.retry_limit as u64 * self.tick_interval_ms;
        if self.sim.command_latency_ms as u64 >= retry_budget {
            warn!(
                "Simulated command latency {} ms exceeds the retry budget of {} ms",
                self.sim.command_latency_ms, retry_budget
            );
        }

        debug!("  tick interval {} ms", self.tick_interval_ms);
        debug!("  family {:?}, starting case {}", self.engine.family, self.engine.starting_case);
        debug!("  retry limit {}", self.engine.retry_limit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opstate_core::config::DeviceFamily;
    use opstate_core::cube::Axis;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = HostConfig::parse("").unwrap();
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.sim, SimTiming::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_tables() {
        let text = r#"
            seed = 42

            [engine]
            family = "generic"
            starting_case = 4

            [engine.timing]
            settle_ms = 1500

            [cube]
            initial_axis = "x"

            [arm]
            failure_rate = 0.1
        "#;
        let config = HostConfig::parse(text).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.engine.family, DeviceFamily::Generic);
        assert_eq!(config.engine.starting_case, 4);
        assert_eq!(config.engine.timing.settle_ms, 1500);
        assert_eq!(config.engine.timing.brief_ms, 1000);
        assert_eq!(config.engine.retry_limit, 10);
        assert_eq!(config.cube.initial_axis, Axis::X);
        assert!((config.arm.failure_rate - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_family_rejected() {
        assert!(HostConfig::parse("[engine]\nfamily = \"ur5\"\n").is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = HostConfig::default();
        config.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(HostError::ZeroTickInterval)));

        let mut config = HostConfig::default();
        config.engine.starting_case = 9;
        assert!(matches!(
            config.validate(),
            Err(HostError::InvalidConfig(ConfigError::StartingCaseOutOfRange))
        ));
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let config = HostConfig::load(Path::new("/nonexistent/opstate.toml")).unwrap();
        assert_eq!(config.seed, 1);
    }
}
