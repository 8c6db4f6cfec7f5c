//! Configuration types
//!
//! Plain data with defaults. The host fills these from a TOML file when the
//! `serde` feature is enabled.

pub mod engine;
pub mod workload;

pub use engine::{DeviceFamily, EngineConfig, Span, Timing};
pub use workload::CubeConfig;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Retry steps need at least one attempt
    ZeroRetryLimit,
    /// Starting case must be within 1..=8
    StartingCaseOutOfRange,
    /// Edge length must be positive
    InvalidEdgeLength,
    /// Edge duration must be non-zero
    ZeroEdgeDuration,
    /// Completion ratio must be within (0, 1]
    CompletionRatioOutOfRange,
    /// Vertex mask uses bits above the third
    InvalidVertex,
}
