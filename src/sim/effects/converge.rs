//! Converging burst
//!
//! A ring of particles flies inward, each timed to reach the origin in its own
//! number of frames. After a delay the merge sub-phase grows the pile toward
//! white until it hits the scale ceiling and flashes the screen.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use super::EffectStatus;
use crate::polar_to_cartesian;
use crate::sim::particles::ParticleSprite;
use crate::sim::state::ScreenTint;
use crate::tuning::ConvergeTuning;

const BASE_TINT: Vec3 = Vec3::new(1.0, 0.78, 0.3);
const BASE_ALPHA: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergePhase {
    Converging,
    Merging,
}

#[derive(Debug, Clone)]
pub struct ConvergeParticle {
    /// Offset from the origin
    pub pos: Vec2,
    pub vel: Vec2,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct BurstConverge {
    tuning: ConvergeTuning,
    phase: ConvergePhase,
    particles: Vec<ConvergeParticle>,
    scale: f32,
}

impl BurstConverge {
    pub fn spawn(tuning: &ConvergeTuning, rng: &mut Pcg32) -> Self {
        let particles = (0..tuning.count)
            .map(|_| {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let radius = rng.random_range(tuning.radius_min..=tuning.radius_max);
                let frames_to_center = rng.random_range(tuning.frames_min..=tuning.frames_max);
                let pos = polar_to_cartesian(radius, angle);
                ConvergeParticle {
                    pos,
                    vel: -pos / frames_to_center,
                    converged: false,
                }
            })
            .collect();

        Self {
            tuning: tuning.clone(),
            phase: ConvergePhase::Converging,
            particles,
            scale: 1.0,
        }
    }

    pub fn update(&mut self, dt: f32, screen: &mut ScreenTint) -> EffectStatus {
        match self.phase {
            ConvergePhase::Converging => {
                let epsilon = self.tuning.epsilon;
                for p in self.particles.iter_mut().filter(|p| !p.converged) {
                    p.pos += p.vel * dt;
                    // Inside the snap radius, or already past the origin
                    if p.pos.length() <= epsilon || p.pos.dot(p.vel) > 0.0 {
                        p.pos = Vec2::ZERO;
                        p.vel = Vec2::ZERO;
                        p.converged = true;
                    }
                }
                EffectStatus::Running
            }
            ConvergePhase::Merging => {
                self.scale = (self.scale + self.tuning.merge_growth * dt).min(self.tuning.scale_ceiling);
                if self.scale >= self.tuning.scale_ceiling {
                    log::info!("Converge merge complete, flashing screen");
                    screen.transition_to(self.tuning.flash_color, self.tuning.flash_secs);
                    return EffectStatus::Finished;
                }
                EffectStatus::Running
            }
        }
    }

    /// Enter the merge sub-phase; stragglers snap to the origin
    pub fn begin_merge(&mut self) {
        if self.phase == ConvergePhase::Merging {
            return;
        }
        for p in &mut self.particles {
            p.pos = Vec2::ZERO;
            p.vel = Vec2::ZERO;
            p.converged = true;
        }
        self.phase = ConvergePhase::Merging;
    }

    pub fn phase(&self) -> ConvergePhase {
        self.phase
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn particles(&self) -> &[ConvergeParticle] {
        &self.particles
    }

    pub fn converged_count(&self) -> usize {
        self.particles.iter().filter(|p| p.converged).count()
    }

    /// 0 while converging, rising to 1 at the scale ceiling
    fn whiteness(&self) -> f32 {
        ((self.scale - 1.0) / (self.tuning.scale_ceiling - 1.0)).clamp(0.0, 1.0)
    }

    pub fn sprites(&self) -> impl Iterator<Item = ParticleSprite> + '_ {
        let w = self.whiteness();
        let size = self.tuning.particle_size * self.scale;
        let tint = BASE_TINT.lerp(Vec3::ONE, w);
        let alpha = BASE_ALPHA + (1.0 - BASE_ALPHA) * w;
        self.particles.iter().map(move |p| ParticleSprite {
            pos: self.tuning.origin + p.pos,
            size,
            alpha,
            tint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CLEAR_COLOR;
    use rand::SeedableRng;

    fn burst() -> BurstConverge {
        let mut rng = Pcg32::seed_from_u64(3);
        BurstConverge::spawn(&ConvergeTuning::default(), &mut rng)
    }

    #[test]
    fn test_particles_start_on_ring_heading_inward() {
        let tuning = ConvergeTuning::default();
        let burst = burst();
        assert_eq!(burst.particles().len(), tuning.count);
        for p in burst.particles() {
            let r = p.pos.length();
            assert!(r >= tuning.radius_min - 1e-4 && r <= tuning.radius_max + 1e-4);
            assert!(p.pos.dot(p.vel) < 0.0);
        }
    }

    #[test]
    fn test_all_particles_converge_within_max_frames() {
        let tuning = ConvergeTuning::default();
        let mut burst = burst();
        let mut screen = ScreenTint::new(Vec3::from_array(CLEAR_COLOR));
        for _ in 0..(tuning.frames_max as usize + 1) {
            assert_eq!(burst.update(1.0, &mut screen), EffectStatus::Running);
        }
        assert_eq!(burst.converged_count(), tuning.count);
        assert!(burst.particles().iter().all(|p| p.pos == Vec2::ZERO));
    }

    #[test]
    fn test_merge_grows_to_ceiling_then_flashes() {
        let tuning = ConvergeTuning::default();
        let mut burst = burst();
        let mut screen = ScreenTint::new(Vec3::from_array(CLEAR_COLOR));
        burst.update(1.0, &mut screen);
        burst.begin_merge();
        assert_eq!(burst.converged_count(), tuning.count);

        let mut frames = 0;
        let mut last_scale = burst.scale();
        while burst.update(1.0, &mut screen) == EffectStatus::Running {
            assert!(burst.scale() > last_scale);
            last_scale = burst.scale();
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(burst.scale(), tuning.scale_ceiling);
        assert!(screen.is_transitioning());
        let sprite = burst.sprites().next().unwrap();
        assert_eq!(sprite.tint, Vec3::ONE);
        assert_eq!(sprite.alpha, 1.0);
    }

    #[test]
    fn test_begin_merge_is_idempotent() {
        let mut burst = burst();
        let mut screen = ScreenTint::new(Vec3::ZERO);
        burst.begin_merge();
        burst.update(1.0, &mut screen);
        let scale = burst.scale();
        burst.begin_merge();
        assert_eq!(burst.scale(), scale);
        assert_eq!(burst.phase(), ConvergePhase::Merging);
    }
}
