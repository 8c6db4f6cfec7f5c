//! Cube tracing workload configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::cube::{Axis, VERTEX_MASK};

/// Cube tracing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CubeConfig {
    /// Edge length in meters
    pub edge_length_m: f32,
    /// Time allotted to one edge
    pub edge_duration_ms: u32,
    /// Fraction of the edge an arm must cover before a move counts as done
    pub completion_ratio: f32,
    /// Starting occupancy mask for both arms
    pub initial_vertex: u8,
    /// Axis treated as "previous" before the first edge
    pub initial_axis: Axis,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            edge_length_m: 0.01,
            edge_duration_ms: 1_000,
            completion_ratio: 0.85,
            initial_vertex: 0b110,
            initial_axis: Axis::Z,
        }
    }
}

impl CubeConfig {
    /// Check the configuration for values the tracer cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.edge_length_m > 0.0) {
            return Err(ConfigError::InvalidEdgeLength);
        }
        if self.edge_duration_ms == 0 {
            return Err(ConfigError::ZeroEdgeDuration);
        }
        if !(self.completion_ratio > 0.0 && self.completion_ratio <= 1.0) {
            return Err(ConfigError::CompletionRatioOutOfRange);
        }
        if self.initial_vertex & !VERTEX_MASK != 0 {
            return Err(ConfigError::InvalidVertex);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CubeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_vertex, 0b110);
        assert_eq!(config.initial_axis, Axis::Z);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = CubeConfig {
            edge_length_m: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidEdgeLength));

        let config = CubeConfig {
            completion_ratio: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CompletionRatioOutOfRange)
        );

        let config = CubeConfig {
            initial_vertex: 0b1000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidVertex));

        let config = CubeConfig {
            edge_duration_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroEdgeDuration));
    }
}
