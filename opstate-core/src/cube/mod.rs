//! Cube-edge tracing workload
//!
//! Each arm walks the edges of a small cube, never moving along the same
//! axis twice in a row. The current vertex is a 3-bit occupancy mask, one
//! bit per pair of opposite faces.

pub mod tracer;
pub mod walk;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use tracer::{CubeTracer, TracePhase, TraceStatus};
pub use walk::{next_heading, CubeWalk};

/// Bits that make up a vertex mask
pub const VERTEX_MASK: u8 = 0b111;

/// Cartesian axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Vertex bit for the face pair crossed by this axis
    ///
    /// X: front/back, Y: left/right, Z: lower/upper.
    pub const fn bit(&self) -> u8 {
        match self {
            Axis::X => 0b001,
            Axis::Y => 0b010,
            Axis::Z => 0b100,
        }
    }

    pub const fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Which of the two tracing arms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmId {
    Left,
    Right,
}

impl ArmId {
    pub const BOTH: [ArmId; 2] = [ArmId::Left, ArmId::Right];

    pub const fn index(&self) -> usize {
        match self {
            ArmId::Left => 0,
            ArmId::Right => 1,
        }
    }
}

/// Direction of one cube edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Heading {
    pub axis: Axis,
    /// Moving toward the positive end of the axis
    pub positive: bool,
}

impl Heading {
    /// Straight down, used to lower the arms onto the cube
    pub const DOWN: Heading = Heading {
        axis: Axis::Z,
        positive: false,
    };

    /// Unit vector along the heading
    pub fn vector(&self) -> [f32; 3] {
        let mut v = [0.0; 3];
        v[self.axis.index()] = if self.positive { 1.0 } else { -1.0 };
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_bits_are_distinct() {
        let all = Axis::ALL.iter().fold(0, |acc, a| acc | a.bit());
        assert_eq!(all, VERTEX_MASK);
    }

    #[test]
    fn test_heading_vector() {
        assert_eq!(Heading::DOWN.vector(), [0.0, 0.0, -1.0]);
        let heading = Heading {
            axis: Axis::Y,
            positive: true,
        };
        assert_eq!(heading.vector(), [0.0, 1.0, 0.0]);
    }
}
