//! Fading particle bursts
//!
//! Particles are grouped into batches tagged with their owner so an effect's
//! teardown can drop exactly the particles it spawned.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::EffectKind;
use crate::tuning::ParticleTuning;

/// Who spawned a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleOwner {
    Ambient,
    Effect(EffectKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1.0 at spawn, removed once it reaches 0
    pub alpha: f32,
}

/// What the renderer draws for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSprite {
    pub pos: Vec2,
    pub size: f32,
    pub alpha: f32,
    pub tint: Vec3,
}

#[derive(Debug, Clone)]
struct Batch {
    owner: ParticleOwner,
    tint: Vec3,
    particles: Vec<Particle>,
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    tuning: ParticleTuning,
    batches: Vec<Batch>,
}

impl ParticleSystem {
    pub fn new(tuning: &ParticleTuning) -> Self {
        Self {
            tuning: tuning.clone(),
            batches: Vec::new(),
        }
    }

    /// Emit `count` particles from `origin` in random directions.
    /// Returns how many were actually spawned (capped by `max_particles`).
    pub fn spawn_burst(
        &mut self,
        origin: Vec2,
        count: usize,
        owner: ParticleOwner,
        tint: Vec3,
        rng: &mut Pcg32,
    ) -> usize {
        let room = self.tuning.max_particles.saturating_sub(self.live_count());
        let count = count.min(room);
        if count == 0 {
            return 0;
        }

        let particles = (0..count)
            .map(|_| {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let speed = rng.random_range(self.tuning.speed_min..=self.tuning.speed_max);
                Particle {
                    pos: origin,
                    vel: crate::polar_to_cartesian(speed, angle),
                    alpha: 1.0,
                }
            })
            .collect();
        self.batches.push(Batch {
            owner,
            tint,
            particles,
        });
        count
    }

    /// Integrate, fade, and drop particles whose alpha reached zero
    pub fn advance(&mut self, dt: f32) {
        let decay = self.tuning.decay_rate * dt;
        for batch in &mut self.batches {
            for particle in &mut batch.particles {
                particle.pos += particle.vel * dt;
                particle.alpha -= decay;
            }
            batch.particles.retain(|p| p.alpha > 0.0);
        }
        self.batches.retain(|b| !b.particles.is_empty());
    }

    /// Drop every particle spawned by `owner`; returns how many were live
    pub fn clear_owner(&mut self, owner: ParticleOwner) -> usize {
        let before = self.live_count();
        self.batches.retain(|b| b.owner != owner);
        before - self.live_count()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }

    pub fn live_count(&self) -> usize {
        self.batches.iter().map(|b| b.particles.len()).sum()
    }

    pub fn count_for(&self, owner: ParticleOwner) -> usize {
        self.batches
            .iter()
            .filter(|b| b.owner == owner)
            .map(|b| b.particles.len())
            .sum()
    }

    pub fn sprites(&self) -> impl Iterator<Item = ParticleSprite> + '_ {
        let size = self.tuning.size;
        self.batches.iter().flat_map(move |batch| {
            batch.particles.iter().map(move |p| ParticleSprite {
                pos: p.pos,
                size,
                alpha: p.alpha.max(0.0),
                tint: batch.tint,
            })
        })
    }
}
