//! Collision detection between the player and obstacles
//!
//! Axis-aligned boxes compared center-to-center, shrunk by a small margin so
//! hits feel fair against the visuals.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Depth given to planar entities so the z test always passes between them
pub const PLANAR_HALF_DEPTH: f32 = 0.5;

/// Axis-aligned bounding box (center + half extents)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub half: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half: Vec3) -> Self {
        Self { center, half }
    }

    /// Box for an entity living in the z = 0 plane
    pub fn planar(center: Vec2, half: Vec2) -> Self {
        Self {
            center: center.extend(0.0),
            half: half.extend(PLANAR_HALF_DEPTH),
        }
    }
}

/// True iff every axis distance is strictly below the summed half extents
/// minus `margin`
pub fn boxes_overlap(a: &Aabb, b: &Aabb, margin: f32) -> bool {
    let delta = (a.center - b.center).abs();
    let reach = a.half + b.half - Vec3::splat(margin);
    delta.cmplt(reach).all()
}

/// Per-obstacle collision flags, in obstacle order
pub fn detect<'a>(player: &Aabb, obstacles: impl IntoIterator<Item = &'a Aabb>, margin: f32) -> Vec<bool> {
    obstacles
        .into_iter()
        .map(|obstacle| boxes_overlap(player, obstacle, margin))
        .collect()
}

/// Index of the first obstacle hit, if any
pub fn first_hit<'a>(player: &Aabb, obstacles: impl IntoIterator<Item = &'a Aabb>, margin: f32) -> Option<usize> {
    obstacles
        .into_iter()
        .position(|obstacle| boxes_overlap(player, obstacle, margin))
}
