//! Secondary actors
//!
//! Two variants share a slot on screen: one bouncing on its own platform under
//! its own gravity, one floating on a sine wave.

use glam::{Vec2, Vec3};

use crate::sim::physics::VerticalBody;
use crate::sim::scene::{NodeHandle, NodeKind, SceneGraph};
use crate::tuning::SecondaryTuning;

/// Actor that bounces on an effect-owned platform
#[derive(Debug)]
pub struct SecondaryBounce {
    actor: NodeHandle,
    platform: NodeHandle,
    x: f32,
    pub body: VerticalBody,
    /// Actor center height when resting on the platform
    pub floor: f32,
    gravity: f32,
    bounce_velocity: f32,
    pub bounces: u32,
}

impl SecondaryBounce {
    pub fn spawn(tuning: &SecondaryTuning, scene: &mut SceneGraph) -> Self {
        let platform_top = tuning.anchor.y + tuning.platform_size.y / 2.0;
        let floor = platform_top + tuning.actor_size.y / 2.0;
        let body = VerticalBody::falling(floor + tuning.drop_height);

        let platform = scene.spawn(
            NodeKind::BouncePlatform,
            tuning.anchor.extend(-0.2),
            tuning.platform_size,
        );
        let actor = scene.spawn(
            NodeKind::BounceActor,
            Vec3::new(tuning.anchor.x, body.y, -0.1),
            tuning.actor_size,
        );

        Self {
            actor,
            platform,
            x: tuning.anchor.x,
            body,
            floor,
            gravity: tuning.gravity,
            bounce_velocity: tuning.bounce_velocity,
            bounces: 0,
        }
    }

    pub fn update(&mut self, dt: f32, scene: &mut SceneGraph) {
        if self.body.integrate(dt, self.gravity, self.floor) {
            self.body.launch(self.bounce_velocity);
            self.bounces += 1;
        }
        scene.set_pos(&self.actor, Vec3::new(self.x, self.body.y, -0.1));
    }

    pub fn teardown(self, scene: &mut SceneGraph) {
        scene.release(self.actor);
        scene.release(self.platform);
    }
}

/// Actor driven by a closed-form sinusoid of elapsed time
#[derive(Debug)]
pub struct SecondaryOscillate {
    actor: NodeHandle,
    anchor: Vec2,
    amplitude: f32,
    period_secs: f32,
}

impl SecondaryOscillate {
    pub fn spawn(tuning: &SecondaryTuning, scene: &mut SceneGraph) -> Self {
        let actor = scene.spawn(NodeKind::OscillateActor, tuning.anchor.extend(-0.1), tuning.actor_size);
        Self {
            actor,
            anchor: tuning.anchor,
            amplitude: tuning.amplitude,
            period_secs: tuning.period_secs,
        }
    }

    /// Position after `elapsed_secs`
    pub fn position_at(&self, elapsed_secs: f32) -> Vec2 {
        let theta = std::f32::consts::TAU * elapsed_secs / self.period_secs;
        Vec2::new(self.anchor.x, self.anchor.y + self.amplitude * theta.sin())
    }

    pub fn update(&mut self, elapsed_secs: f32, scene: &mut SceneGraph) {
        let pos = self.position_at(elapsed_secs);
        scene.set_pos(&self.actor, pos.extend(-0.1));
    }

    pub fn teardown(self, scene: &mut SceneGraph) {
        scene.release(self.actor);
    }
}
