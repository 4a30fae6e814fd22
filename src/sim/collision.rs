//! Proximity and edge tests for the continuous stage
//!
//! The stage is a square 0..STAGE_SIZE; the avatar must keep EDGE_MARGIN
//! from every side. Contacts are plain Euclidean distance checks.

use glam::Vec2;

use crate::consts::*;

/// Which axes left the playable band on a proposed move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeHit {
    pub x: bool,
    pub y: bool,
}

impl EdgeHit {
    #[inline]
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

#[inline]
fn outside_band(v: f32) -> bool {
    v > STAGE_SIZE - EDGE_MARGIN || v < EDGE_MARGIN
}

/// Check a proposed position against the edge margins
pub fn edge_hit(pos: Vec2) -> EdgeHit {
    EdgeHit {
        x: outside_band(pos.x),
        y: outside_band(pos.y),
    }
}

/// Clamp a coordinate back onto the margin it crossed
#[inline]
pub fn clamp_to_band(v: f32) -> f32 {
    v.clamp(EDGE_MARGIN, STAGE_SIZE - EDGE_MARGIN)
}

/// Reflect the heading components flagged in `hit`
pub fn reflect_heading(heading: Vec2, hit: EdgeHit) -> Vec2 {
    Vec2::new(
        if hit.x { -heading.x } else { heading.x },
        if hit.y { -heading.y } else { heading.y },
    )
}

/// True if `a` and `b` are closer than `radius`
#[inline]
pub fn in_contact(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance(b) < radius
}

/// Index of the first hazard in contact with `pos`
pub fn first_contact(pos: Vec2, hazards: &[Vec2], radius: f32) -> Option<usize> {
    hazards.iter().position(|h| in_contact(pos, *h, radius))
}
