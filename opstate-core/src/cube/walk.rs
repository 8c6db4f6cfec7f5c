//! Random walk over cube edges

use rand::Rng;

use super::{Axis, Heading, VERTEX_MASK};
use crate::config::CubeConfig;

/// Position of one arm on the cube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CubeWalk {
    vertex: u8,
    previous: Axis,
}

impl CubeWalk {
    pub const fn new(vertex: u8, previous: Axis) -> Self {
        Self {
            vertex: vertex & VERTEX_MASK,
            previous,
        }
    }

    pub fn from_config(config: &CubeConfig) -> Self {
        Self::new(config.initial_vertex, config.initial_axis)
    }

    /// Current occupancy mask
    pub fn vertex(&self) -> u8 {
        self.vertex
    }

    /// Axis of the last edge taken
    pub fn previous_axis(&self) -> Axis {
        self.previous
    }

    /// Take the edge along `axis`, flipping its vertex bit
    ///
    /// A set bit is cleared by moving negative; a clear bit is set by moving
    /// positive.
    pub fn take(&mut self, axis: Axis) -> Heading {
        let bit = axis.bit();
        let positive = self.vertex & bit == 0;
        self.vertex ^= bit;
        self.previous = axis;
        Heading { axis, positive }
    }
}

/// Pick the next edge for `walk`, never repeating the previous axis
pub fn next_heading<R: Rng + ?Sized>(walk: &mut CubeWalk, rng: &mut R) -> Heading {
    let mut axis = walk.previous_axis();
    while axis == walk.previous_axis() {
        axis = Axis::ALL[rng.gen_range(0..Axis::ALL.len())];
    }
    walk.take(axis)
}
