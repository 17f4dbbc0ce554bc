//! Vertical physics for the player and effect actors
//!
//! Semi-implicit Euler in normalized frame units: velocity first, then
//! position, then the floor clamp.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::scene::{NodeHandle, NodeKind, SceneGraph};
use crate::tuning::WorldTuning;

/// A body that only moves vertically
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalBody {
    pub y: f32,
    pub vy: f32,
    pub on_ground: bool,
}

impl VerticalBody {
    /// Body at rest on a floor
    pub fn resting(y: f32) -> Self {
        Self {
            y,
            vy: 0.0,
            on_ground: true,
        }
    }

    /// Body released at `y` with no velocity
    pub fn falling(y: f32) -> Self {
        Self {
            y,
            vy: 0.0,
            on_ground: false,
        }
    }

    /// Integrate gravity while airborne. Returns true on the landing frame.
    pub fn integrate(&mut self, dt: f32, gravity: f32, floor: f32) -> bool {
        if self.on_ground {
            return false;
        }
        self.vy -= gravity * dt;
        self.y += self.vy * dt;
        if self.y <= floor {
            self.y = floor;
            self.vy = 0.0;
            self.on_ground = true;
            return true;
        }
        false
    }

    /// Leave the floor with an upward velocity
    pub fn launch(&mut self, velocity: f32) {
        self.vy = velocity;
        self.on_ground = false;
    }
}

/// The controlled runner
#[derive(Debug)]
pub struct Player {
    /// Fixed horizontal position
    pub x: f32,
    pub body: VerticalBody,
    pub half_extents: Vec2,
    /// Resting center height (ground + half height)
    pub rest_y: f32,
    node: NodeHandle,
}

impl Player {
    pub fn new(world: &WorldTuning, scene: &mut SceneGraph) -> Self {
        let half_extents = world.player_size / 2.0;
        let rest_y = world.ground_y + half_extents.y;
        let node = scene.spawn(
            NodeKind::Player,
            Vec3::new(world.player_x, rest_y, 0.0),
            world.player_size,
        );
        Self {
            x: world.player_x,
            body: VerticalBody::resting(rest_y),
            half_extents,
            rest_y,
            node,
        }
    }

    /// Put the player back at its start position
    pub fn reset(&mut self, world: &WorldTuning) {
        self.body = if world.player_drop_height > 0.0 {
            VerticalBody::falling(self.rest_y + world.player_drop_height)
        } else {
            VerticalBody::resting(self.rest_y)
        };
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.body.y)
    }

    pub fn on_ground(&self) -> bool {
        self.body.on_ground
    }

    /// Gravity step. Returns true on the landing frame.
    pub fn apply_gravity(&mut self, dt: f32, gravity: f32) -> bool {
        self.body.integrate(dt, gravity, self.rest_y)
    }

    /// Jump if grounded and the session is live; silently ignored otherwise
    pub fn jump(&mut self, session_active: bool, jump_velocity: f32) -> bool {
        if !session_active || !self.body.on_ground {
            return false;
        }
        self.body.launch(jump_velocity);
        true
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::planar(self.pos(), self.half_extents)
    }

    /// Push position and visual scale to the scene node
    pub fn sync_node(&self, scene: &mut SceneGraph, visual_scale: f32) {
        if let Some(node) = scene.node_mut(&self.node) {
            node.pos = self.pos().extend(0.0);
            node.scale = self.half_extents * 2.0 * visual_scale;
        }
    }
}
