//! Spiraling decals
//!
//! Sprites orbiting a center on independent polar trajectories while their
//! radius shrinks toward a floor. Runs until expired by the orchestrator.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::EffectCtx;
use crate::sim::scene::{NodeHandle, NodeKind, SceneGraph};
use crate::tuning::SpiralTuning;
use crate::{normalize_angle, polar_to_cartesian};

/// Per-decal motion record
#[derive(Debug)]
pub struct SpiralDecal {
    node: NodeHandle,
    pub angle: f32,
    /// Radians per frame
    pub speed: f32,
    pub radius: f32,
    /// Fixed angular offset
    pub phase: f32,
}

#[derive(Debug)]
pub struct SpiralDecals {
    center: Vec2,
    radius_floor: f32,
    shrink_rate: f32,
    decals: Vec<SpiralDecal>,
}

impl SpiralDecals {
    pub fn spawn(tuning: &SpiralTuning, ctx: &mut EffectCtx) -> Self {
        let count = tuning.count;
        let decals = (0..count)
            .map(|i| {
                let phase = i as f32 / count as f32 * std::f32::consts::TAU;
                let speed = ctx.rng.random_range(tuning.speed_min..=tuning.speed_max);
                let pos = tuning.center + polar_to_cartesian(tuning.radius_start, phase);
                let node = ctx.scene.spawn(
                    NodeKind::SpiralDecal,
                    pos.extend(-0.5),
                    Vec2::splat(tuning.size),
                );
                SpiralDecal {
                    node,
                    angle: 0.0,
                    speed,
                    radius: tuning.radius_start,
                    phase,
                }
            })
            .collect();

        Self {
            center: tuning.center,
            radius_floor: tuning.radius_floor,
            shrink_rate: tuning.shrink_rate,
            decals,
        }
    }

    pub fn update(&mut self, dt: f32, scene: &mut SceneGraph) {
        for decal in &mut self.decals {
            decal.angle = normalize_angle(decal.angle + decal.speed * dt);
            decal.radius = (decal.radius - self.shrink_rate * dt).max(self.radius_floor);
            let pos = self.center + polar_to_cartesian(decal.radius, decal.angle + decal.phase);
            scene.set_pos(&decal.node, Vec3::new(pos.x, pos.y, -0.5));
        }
    }

    pub fn decals(&self) -> &[SpiralDecal] {
        &self.decals
    }

    pub fn node_count(&self) -> usize {
        self.decals.len()
    }

    pub fn teardown(self, scene: &mut SceneGraph) {
        for decal in self.decals {
            scene.release(decal.node);
        }
    }
}
