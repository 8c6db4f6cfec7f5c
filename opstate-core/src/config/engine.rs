//! Test engine configuration
//!
//! The delays and the retry limit are empirical values that worked against
//! real hardware. They are defaults, not invariants.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::cases::CASE_COUNT;

/// Robot family, for behavior that differs between families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeviceFamily {
    /// Pausing during homing drops the robot to disabled (e-stop)
    #[default]
    Raven,
    /// Pausing during homing is a soft pause
    Generic,
}

impl DeviceFamily {
    /// Whether a pause issued while homing escalates to a full disable
    pub fn pause_escalates(&self) -> bool {
        matches!(self, DeviceFamily::Raven)
    }

    /// Whether the operator must cycle the e-stop before homing from disabled
    pub fn needs_estop_cycle(&self) -> bool {
        matches!(self, DeviceFamily::Raven)
    }
}

/// Named delays referenced by step tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Span {
    /// Short settle after a command (1 s)
    Brief,
    /// Settle after a command (3 s)
    Settle,
    /// Time allowed for homing to start (10 s)
    HomingStart,
    /// Time allowed for homing to finish (30 s)
    HomingFinish,
}

/// Delay values in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Timing {
    /// Grace period after first contact before the first case runs
    pub link_settle_ms: u32,
    pub brief_ms: u32,
    pub settle_ms: u32,
    pub homing_start_ms: u32,
    pub homing_finish_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            link_settle_ms: 2_000,
            brief_ms: 1_000,
            settle_ms: 3_000,
            homing_start_ms: 10_000,
            homing_finish_ms: 30_000,
        }
    }
}

impl Timing {
    /// Resolve a named delay
    pub fn span_ms(&self, span: Span) -> u64 {
        let ms = match span {
            Span::Brief => self.brief_ms,
            Span::Settle => self.settle_ms,
            Span::HomingStart => self.homing_start_ms,
            Span::HomingFinish => self.homing_finish_ms,
        };
        ms as u64
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub timing: Timing,
    /// Commands a retry step may send before giving up
    pub retry_limit: u8,
    pub family: DeviceFamily,
    /// First case to run (1-based); earlier cases are skipped
    pub starting_case: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            retry_limit: 10,
            family: DeviceFamily::default(),
            starting_case: 1,
        }
    }
}

impl EngineConfig {
    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_limit == 0 {
            return Err(ConfigError::ZeroRetryLimit);
        }
        if self.starting_case == 0 || self.starting_case as usize > CASE_COUNT {
            return Err(ConfigError::StartingCaseOutOfRange);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let timing = Timing::default();
        assert_eq!(timing.span_ms(Span::Brief), 1_000);
        assert_eq!(timing.span_ms(Span::Settle), 3_000);
        assert_eq!(timing.span_ms(Span::HomingStart), 10_000);
        assert_eq!(timing.span_ms(Span::HomingFinish), 30_000);
        assert_eq!(timing.link_settle_ms, 2_000);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.retry_limit, 10);
        assert_eq!(config.starting_case, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_starting_case() {
        let config = EngineConfig {
            starting_case: 9,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StartingCaseOutOfRange));

        let config = EngineConfig {
            starting_case: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StartingCaseOutOfRange));
    }

    #[test]
    fn test_zero_retry_limit() {
        let config = EngineConfig {
            retry_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetryLimit));
    }

    #[test]
    fn test_family_behavior() {
        assert!(DeviceFamily::Raven.pause_escalates());
        assert!(DeviceFamily::Raven.needs_estop_cycle());
        assert!(!DeviceFamily::Generic.pause_escalates());
    }
}
