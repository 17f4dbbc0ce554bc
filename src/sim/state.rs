//! Game state aggregate
//!
//! Everything a session mutates lives in [`GameState`]: score, player,
//! obstacles, effects, particles and the scene they draw into. Components get
//! it by reference each frame; there is no global state.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::assets::AssetRegistry;
use super::effects::{EffectCtx, EffectKind, EffectOrchestrator, TriggerOutcome};
use super::obstacles::ObstacleField;
use super::particles::{ParticleSprite, ParticleSystem};
use super::physics::Player;
use super::scene::SceneGraph;
use crate::tuning::{Tuning, TuningError};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting for the first start input
    NotStarted,
    Playing,
    /// Frozen after a collision until the next start
    GameOver,
}

/// Camera parameters animated by effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Projection zoom (1.0 = full view)
    pub zoom: f32,
    /// Visual scale applied to the player sprite
    pub focus_scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            focus_scale: 1.0,
        }
    }
}

impl Camera {
    /// Exact at both ends: `t == 0` gives `self`, `t == 1` gives `to`
    pub fn lerp(self, to: Camera, t: f32) -> Camera {
        let mix = |a: f32, b: f32| a * (1.0 - t) + b * t;
        Camera {
            zoom: mix(self.zoom, to.zoom),
            focus_scale: mix(self.focus_scale, to.focus_scale),
        }
    }
}

/// Background colour with timed transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenTint {
    base: Vec3,
    from: Vec3,
    to: Vec3,
    current: Vec3,
    elapsed: f32,
    duration: f32,
}

impl ScreenTint {
    pub fn new(base: Vec3) -> Self {
        Self {
            base,
            from: base,
            to: base,
            current: base,
            elapsed: 0.0,
            duration: 0.0,
        }
    }

    pub fn current(&self) -> Vec3 {
        self.current
    }

    /// Fade from the current colour to `color` over `secs`
    pub fn transition_to(&mut self, color: Vec3, secs: f32) {
        self.from = self.current;
        self.to = color;
        self.elapsed = 0.0;
        self.duration = secs.max(0.0);
        if self.duration == 0.0 {
            self.current = color;
        }
    }

    pub fn advance(&mut self, secs: f32) {
        if !self.is_transitioning() {
            return;
        }
        self.elapsed = (self.elapsed + secs).min(self.duration);
        self.current = self.from.lerp(self.to, self.elapsed / self.duration);
        if self.elapsed >= self.duration {
            self.current = self.to;
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.duration > 0.0 && self.elapsed < self.duration
    }

    /// Snap back to the base colour
    pub fn reset(&mut self) {
        *self = Self::new(self.base);
    }
}

/// Complete session state
#[derive(Debug)]
pub struct GameState {
    pub tuning: Tuning,
    pub phase: SessionPhase,
    pub score: u64,
    /// Seconds of play in the current session
    pub time_secs: f32,
    pub frame_count: u64,
    pub player: Player,
    pub obstacles: ObstacleField,
    pub effects: EffectOrchestrator,
    /// Ambient and effect-spawned particle bursts
    pub particles: ParticleSystem,
    pub scene: SceneGraph,
    pub camera: Camera,
    pub screen: ScreenTint,
    pub assets: AssetRegistry,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
}

impl GameState {
    /// Rejects a tuning that fails [`Tuning::validate`]
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        let mut scene = SceneGraph::new();
        let player = Player::new(&tuning.world, &mut scene);
        Ok(Self {
            phase: SessionPhase::NotStarted,
            score: 0,
            time_secs: 0.0,
            frame_count: 0,
            player,
            obstacles: ObstacleField::new(&tuning.world, &tuning.obstacles),
            effects: EffectOrchestrator::new(&tuning.effects),
            particles: ParticleSystem::new(&tuning.particles),
            scene,
            camera: Camera::default(),
            screen: ScreenTint::new(tuning.world.clear_color),
            assets: AssetRegistry::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
        })
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Full reset into Playing. Same path for the first start and restarts.
    pub fn start(&mut self) {
        let (effects, mut ctx) = self.split_effects();
        effects.teardown_all(&mut ctx);
        self.particles.clear();
        self.screen.reset();
        self.camera = Camera::default();

        self.score = 0;
        self.time_secs = 0.0;
        self.frame_count = 0;
        self.player.reset(&self.tuning.world);
        self.obstacles.reset(self.player.x, &mut self.scene, &mut self.rng);
        self.player.sync_node(&mut self.scene, self.camera.focus_scale);

        self.phase = SessionPhase::Playing;
        log::info!("Session started ({} obstacles queued)", self.obstacles.len());
    }

    /// Playing -> GameOver. Tears down every effect; returns false in any
    /// other phase.
    pub fn game_over(&mut self) -> bool {
        if self.phase != SessionPhase::Playing {
            return false;
        }
        self.phase = SessionPhase::GameOver;
        let (effects, mut ctx) = self.split_effects();
        effects.teardown_all(&mut ctx);
        log::info!("Game over with score {}", self.score);
        true
    }

    /// Jump if playing and grounded
    pub fn jump(&mut self) -> bool {
        let jumped = self
            .player
            .jump(self.is_playing(), self.tuning.world.jump_velocity);
        if jumped {
            log::trace!("Jump at frame {}", self.frame_count);
        }
        jumped
    }

    /// Trigger an effect directly. `None` outside of Playing.
    pub fn trigger_effect(&mut self, kind: EffectKind) -> Option<TriggerOutcome> {
        if !self.is_playing() {
            return None;
        }
        let (effects, mut ctx) = self.split_effects();
        Some(effects.trigger(kind, &mut ctx))
    }

    /// Borrow the orchestrator alongside the world it acts on
    pub fn split_effects(&mut self) -> (&mut EffectOrchestrator, EffectCtx<'_>) {
        let focus = self.player.pos();
        (
            &mut self.effects,
            EffectCtx {
                scene: &mut self.scene,
                particles: &mut self.particles,
                camera: &mut self.camera,
                screen: &mut self.screen,
                rng: &mut self.rng,
                assets: &self.assets,
                focus,
            },
        )
    }

    /// Everything the renderer draws as a point sprite
    pub fn particle_sprites(&self) -> impl Iterator<Item = ParticleSprite> + '_ {
        self.particles.sprites().chain(self.effects.sprites())
    }

    /// Player feet, where landing dust spawns
    pub fn player_feet(&self) -> Vec2 {
        self.player.pos() - Vec2::new(0.0, self.player.half_extents.y)
    }
}
