//! Sprite Runner - a single-screen endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacles, collisions, effects)
//! - `session`: Start / Playing / GameOver sequencing and the per-frame loop
//! - `tuning`: Data-driven game balance

pub mod session;
pub mod sim;
pub mod tuning;

pub use session::{InputSignal, LoopControl, Session, UiView};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// World constants (defaults for [`Tuning`])
pub mod consts {
    /// Wall-clock frame interval that maps to `dt == 1.0`
    pub const REFERENCE_FRAME_MS: f32 = 16.7;
    /// Largest normalized dt accepted in one frame (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 4.0;

    /// Ground plane height
    pub const GROUND_Y: f32 = -2.0;
    /// Fixed horizontal position of the player
    pub const PLAYER_X: f32 = -4.5;
    /// Player full size (width, height)
    pub const PLAYER_WIDTH: f32 = 1.0;
    pub const PLAYER_HEIGHT: f32 = 1.1;

    /// Obstacle full size (width, height)
    pub const OBSTACLE_WIDTH: f32 = 1.3;
    pub const OBSTACLE_HEIGHT: f32 = 1.6;
    /// Distance ahead of the player where a recycled obstacle reappears
    pub const OBSTACLE_GAP: f32 = 10.0;
    /// Obstacles this far behind the player are passed
    pub const TRAILING_DISTANCE: f32 = 3.0;

    /// Horizontal obstacle speed (units per frame)
    pub const GAME_SPEED: f32 = 0.13;
    /// Gravity (units per frame²)
    pub const GRAVITY: f32 = 0.045;
    /// Upward velocity applied on jump
    pub const JUMP_VELOCITY: f32 = 0.7;

    /// Shrinks hit boxes so they feel smaller than their visuals
    pub const COLLISION_MARGIN: f32 = 0.09;

    /// Orthographic view height in world units
    pub const VIEW_SIZE: f32 = 12.0;
    /// Default clear color (0x222244)
    pub const CLEAR_COLOR: [f32; 3] = [0x22 as f32 / 255.0, 0x22 as f32 / 255.0, 0x44 as f32 / 255.0];
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
