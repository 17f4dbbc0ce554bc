//! Data-driven game balance
//!
//! Every field has a default matching the shipped game, so a JSON override only
//! needs the values it changes. Persisted in LocalStorage on the web build.

use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::EffectKind;

/// Errors raised while loading or validating a [`Tuning`]
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
    TuningError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Player, obstacle and world geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub ground_y: f32,
    pub player_x: f32,
    /// Full size (width, height)
    pub player_size: Vec2,
    /// Full size (width, height)
    pub obstacle_size: Vec2,
    pub gravity: f32,
    pub jump_velocity: f32,
    /// Obstacle advance per frame
    pub game_speed: f32,
    pub collision_margin: f32,
    /// Obstacles further than this behind the player count as passed
    pub trailing_distance: f32,
    /// Height above the ground the player is dropped from at session start
    pub player_drop_height: f32,
    pub clear_color: Vec3,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            ground_y: GROUND_Y,
            player_x: PLAYER_X,
            player_size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            obstacle_size: Vec2::new(OBSTACLE_WIDTH, OBSTACLE_HEIGHT),
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            game_speed: GAME_SPEED,
            collision_margin: COLLISION_MARGIN,
            trailing_distance: TRAILING_DISTANCE,
            player_drop_height: 0.0,
            clear_color: Vec3::from_array(CLEAR_COLOR),
        }
    }
}

/// Frame clock normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockTuning {
    pub reference_frame_ms: f32,
    pub max_dt: f32,
}

impl Default for ClockTuning {
    fn default() -> Self {
        Self {
            reference_frame_ms: REFERENCE_FRAME_MS,
            max_dt: MAX_FRAME_DT,
        }
    }
}

/// Where a recycled obstacle reappears
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecycleGap {
    /// Fixed distance ahead of the player
    Fixed(f32),
    /// Distance the obstacle covers in this many reference frames
    Frames(f32),
}

/// Obstacle spawn policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ObstaclePolicy {
    /// One obstacle, repositioned ahead of the player every time it is passed
    SingleRecycle { gap: RecycleGap },
    /// Obstacles queued ahead at random gaps in `[min_gap, max_gap]`
    Queued {
        min_gap: f32,
        max_gap: f32,
        /// Distance ahead of the player for the first obstacle
        first_gap: f32,
        /// How far ahead of the player the lane is kept populated
        spawn_horizon: f32,
        spawn_buffer: f32,
    },
}

impl Default for ObstaclePolicy {
    fn default() -> Self {
        ObstaclePolicy::SingleRecycle {
            gap: RecycleGap::Fixed(OBSTACLE_GAP),
        }
    }
}

/// Ambient particle bursts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleTuning {
    pub speed_min: f32,
    pub speed_max: f32,
    /// Alpha lost per frame
    pub decay_rate: f32,
    pub size: f32,
    /// Particles kicked up when the player lands (0 disables)
    pub landing_dust: usize,
    pub max_particles: usize,
}

impl Default for ParticleTuning {
    fn default() -> Self {
        Self {
            speed_min: 0.04,
            speed_max: 0.16,
            decay_rate: 0.025,
            size: 0.12,
            landing_dust: 6,
            max_particles: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralTuning {
    pub count: usize,
    pub center: Vec2,
    pub radius_start: f32,
    pub radius_floor: f32,
    /// Radius lost per frame
    pub shrink_rate: f32,
    /// Angular speed range (radians per frame)
    pub speed_min: f32,
    pub speed_max: f32,
    pub size: f32,
    pub duration_secs: f32,
}

impl Default for SpiralTuning {
    fn default() -> Self {
        Self {
            count: 8,
            center: Vec2::new(0.0, 1.0),
            radius_start: 5.0,
            radius_floor: 1.2,
            shrink_rate: 0.012,
            speed_min: 0.02,
            speed_max: 0.06,
            size: 0.6,
            duration_secs: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergeTuning {
    pub count: usize,
    pub origin: Vec2,
    pub radius_min: f32,
    pub radius_max: f32,
    /// Frames a particle takes to reach the origin
    pub frames_min: f32,
    pub frames_max: f32,
    /// Snap distance around the origin
    pub epsilon: f32,
    pub particle_size: f32,
    pub merge_delay_secs: f32,
    /// Scale added per frame while merging
    pub merge_growth: f32,
    pub scale_ceiling: f32,
    pub flash_color: Vec3,
    pub flash_secs: f32,
}

impl Default for ConvergeTuning {
    fn default() -> Self {
        Self {
            count: 60,
            origin: Vec2::new(0.0, 1.0),
            radius_min: 4.0,
            radius_max: 8.0,
            frames_min: 60.0,
            frames_max: 120.0,
            epsilon: 0.05,
            particle_size: 0.15,
            merge_delay_secs: 3.2,
            merge_growth: 0.04,
            scale_ceiling: 3.0,
            flash_color: Vec3::new(0.92, 0.92, 1.0),
            flash_secs: 1.5,
        }
    }
}

/// Secondary actor (bounce and oscillate variants)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryTuning {
    /// Center of the platform (bounce) or rest position (oscillate)
    pub anchor: Vec2,
    pub actor_size: Vec2,
    pub platform_size: Vec2,
    pub gravity: f32,
    pub bounce_velocity: f32,
    /// Height above the platform the actor is dropped from
    pub drop_height: f32,
    pub amplitude: f32,
    pub period_secs: f32,
    pub duration_secs: f32,
}

impl Default for SecondaryTuning {
    fn default() -> Self {
        Self {
            anchor: Vec2::new(4.0, 0.0),
            actor_size: Vec2::new(0.8, 0.9),
            platform_size: Vec2::new(1.6, 0.3),
            gravity: 0.03,
            bounce_velocity: 0.45,
            drop_height: 2.5,
            amplitude: 1.2,
            period_secs: 2.0,
            duration_secs: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomTuning {
    /// Hold time of ZoomIn, BurstA, ZoomOut, ZoomInAgain, BurstB
    pub phase_secs: [f32; 5],
    pub target_scale: f32,
    pub camera_zoom: f32,
    pub burst_count: usize,
    pub halo_size: Vec2,
    pub budget_secs: f32,
}

impl Default for ZoomTuning {
    fn default() -> Self {
        Self {
            phase_secs: [0.5, 0.4, 0.5, 0.5, 0.4],
            target_scale: 2.2,
            camera_zoom: 1.6,
            burst_count: 24,
            halo_size: Vec2::new(1.4, 1.4),
            budget_secs: 6.0,
        }
    }
}

/// Fire `kind` whenever the score reaches a positive multiple of `every`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRule {
    pub kind: EffectKind,
    pub every: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    pub spiral: SpiralTuning,
    pub converge: ConvergeTuning,
    pub secondary: SecondaryTuning,
    pub zoom: ZoomTuning,
    pub triggers: Vec<TriggerRule>,
    /// Effect fired by the activate-effect key
    pub key_effect: EffectKind,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            spiral: SpiralTuning::default(),
            converge: ConvergeTuning::default(),
            secondary: SecondaryTuning::default(),
            zoom: ZoomTuning::default(),
            triggers: vec![
                TriggerRule {
                    kind: EffectKind::SpiralDecals,
                    every: 10,
                },
                TriggerRule {
                    kind: EffectKind::SecondaryBounce,
                    every: 20,
                },
                TriggerRule {
                    kind: EffectKind::BurstConverge,
                    every: 50,
                },
            ],
            key_effect: EffectKind::MultiPhaseZoom,
        }
    }
}

/// Complete game balance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub clock: ClockTuning,
    pub obstacles: ObstaclePolicy,
    pub particles: ParticleTuning,
    pub effects: EffectTuning,
    /// Fixed RNG seed (None = seeded by the caller)
    pub seed: Option<u64>,
}

impl Tuning {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "sprite_runner_tuning";

    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let w = &self.world;
        if w.player_size.min_element() <= 0.0 || w.obstacle_size.min_element() <= 0.0 {
            return Err(invalid("world", "entity sizes must be positive"));
        }
        if w.gravity <= 0.0 {
            return Err(invalid("world.gravity", "must be positive"));
        }
        if w.collision_margin < 0.0 {
            return Err(invalid("world.collision_margin", "must not be negative"));
        }
        if self.clock.reference_frame_ms <= 0.0 || self.clock.max_dt <= 0.0 {
            return Err(invalid("clock", "frame interval and max dt must be positive"));
        }

        match self.obstacles {
            ObstaclePolicy::SingleRecycle { gap } => {
                let value = match gap {
                    RecycleGap::Fixed(v) | RecycleGap::Frames(v) => v,
                };
                if value <= 0.0 {
                    return Err(invalid("obstacles.gap", "must be positive"));
                }
            }
            ObstaclePolicy::Queued {
                min_gap,
                max_gap,
                first_gap,
                spawn_horizon,
                spawn_buffer,
            } => {
                if min_gap <= 0.0 || min_gap > max_gap {
                    return Err(invalid(
                        "obstacles.min_gap",
                        format!("need 0 < min_gap <= max_gap, got {min_gap} / {max_gap}"),
                    ));
                }
                if first_gap <= 0.0 || spawn_horizon <= first_gap || spawn_buffer < 0.0 {
                    return Err(invalid(
                        "obstacles.spawn_horizon",
                        "need 0 < first_gap < spawn_horizon and spawn_buffer >= 0",
                    ));
                }
            }
        }

        let p = &self.particles;
        if p.speed_min < 0.0 || p.speed_min > p.speed_max {
            return Err(invalid("particles.speed_min", "need 0 <= speed_min <= speed_max"));
        }
        if p.decay_rate <= 0.0 {
            return Err(invalid("particles.decay_rate", "must be positive"));
        }

        let e = &self.effects;
        if e.spiral.count == 0 || e.spiral.speed_min > e.spiral.speed_max || e.spiral.duration_secs <= 0.0 {
            return Err(invalid("effects.spiral", "bad count, speed range or duration"));
        }
        let c = &e.converge;
        if c.count == 0 || c.radius_min > c.radius_max || c.frames_min < 1.0 || c.frames_min > c.frames_max {
            return Err(invalid("effects.converge", "bad count, radius or frame range"));
        }
        if c.merge_growth <= 0.0 || c.scale_ceiling <= 1.0 {
            return Err(invalid(
                "effects.converge.merge_growth",
                "merge must grow toward a ceiling above 1",
            ));
        }
        if e.secondary.duration_secs <= 0.0 || e.secondary.period_secs <= 0.0 {
            return Err(invalid("effects.secondary", "durations must be positive"));
        }
        if e.zoom.phase_secs.iter().any(|&s| s <= 0.0) || e.zoom.budget_secs <= 0.0 {
            return Err(invalid("effects.zoom", "phase durations and budget must be positive"));
        }
        if let Some(rule) = e.triggers.iter().find(|r| r.every == 0) {
            return Err(invalid(
                "effects.triggers",
                format!("{:?} has a zero interval", rule.kind),
            ));
        }
        Ok(())
    }

    /// Seconds represented by a normalized frame delta
    pub fn secs_per_frame(&self) -> f32 {
        self.clock.reference_frame_ms / 1000.0
    }

    /// Load tuning overrides from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning overrides from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {e}"),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "world": { "gravity": 0.06 }, "seed": 7 }"#).unwrap();
        assert_eq!(tuning.world.gravity, 0.06);
        assert_eq!(tuning.world.player_x, PLAYER_X);
        assert_eq!(tuning.seed, Some(7));
        assert_eq!(tuning.effects, EffectTuning::default());
    }

    #[test]
    fn test_queued_policy_from_json() {
        let json = r#"{
            "obstacles": {
                "policy": "queued",
                "min_gap": 6.0,
                "max_gap": 12.0,
                "first_gap": 10.0,
                "spawn_horizon": 40.0,
                "spawn_buffer": 5.0
            }
        }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert!(matches!(
            tuning.obstacles,
            ObstaclePolicy::Queued { min_gap, max_gap, .. } if min_gap == 6.0 && max_gap == 12.0
        ));
    }

    #[test]
    fn test_inverted_gap_range_rejected() {
        let json = r#"{
            "obstacles": {
                "policy": "queued",
                "min_gap": 12.0,
                "max_gap": 6.0,
                "first_gap": 10.0,
                "spawn_horizon": 40.0,
                "spawn_buffer": 5.0
            }
        }"#;
        let err = Tuning::from_json(json).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "obstacles.min_gap", .. }));
    }

    #[test]
    fn test_zero_trigger_interval_rejected() {
        let mut tuning = Tuning::default();
        tuning.effects.triggers.push(TriggerRule {
            kind: EffectKind::SecondaryOscillate,
            every: 0,
        });
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_zero_spiral_count_rejected() {
        let mut tuning = Tuning::default();
        tuning.effects.spiral.count = 0;
        let err = tuning.validate().unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "effects.spiral", .. }));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Tuning::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TuningError::Io { .. }));
    }
}
