//! Per-frame simulation step
//!
//! Order within a frame: input, player physics, obstacles and score,
//! collision, effects, particles, screen tint, node sync. A collision ends the
//! frame immediately.

use glam::Vec3;

use super::clock::Step;
use super::collision;
use super::effects::{EffectKind, TriggerOutcome};
use super::particles::ParticleOwner;
use super::state::GameState;

const DUST_TINT: Vec3 = Vec3::new(0.85, 0.8, 0.7);

/// Input signals for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Pointer/touch while playing
    pub jump: bool,
    /// Dedicated effect key
    pub activate_effect: bool,
}

/// What happened during a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Obstacles passed (score gained)
    pub passed: u32,
    pub landed: bool,
    pub started: Vec<EffectKind>,
    pub collided: bool,
}

/// Advance the game state by one frame. No-op unless playing.
pub fn tick(state: &mut GameState, input: &TickInput, step: Step) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if !state.is_playing() {
        return outcome;
    }
    state.frame_count += 1;
    state.time_secs += step.secs;

    if input.jump {
        state.jump();
    }
    if input.activate_effect {
        let kind = state.tuning.effects.key_effect;
        if state.trigger_effect(kind) == Some(TriggerOutcome::Started) {
            outcome.started.push(kind);
        }
    }

    // Player
    if state.player.apply_gravity(step.dt, state.tuning.world.gravity) {
        outcome.landed = true;
        let feet = state.player_feet();
        let count = state.tuning.particles.landing_dust;
        if count > 0 {
            state
                .particles
                .spawn_burst(feet, count, ParticleOwner::Ambient, DUST_TINT, &mut state.rng);
        }
    }

    // Obstacles; each pass is its own score event
    let passed = state
        .obstacles
        .advance(step.dt, state.player.x, &mut state.scene, &mut state.rng);
    for _ in 0..passed {
        state.score += 1;
        let score = state.score;
        let (effects, mut ctx) = state.split_effects();
        outcome.started.extend(effects.on_score(score, &mut ctx));
    }
    outcome.passed = passed;

    // Collision
    let obstacles = state.obstacles.bounds();
    let margin = state.tuning.world.collision_margin;
    if collision::first_hit(&state.player.bounds(), &obstacles, margin).is_some() {
        state.game_over();
        state.player.sync_node(&mut state.scene, state.camera.focus_scale);
        outcome.collided = true;
        return outcome;
    }

    // Effects
    let (effects, mut ctx) = state.split_effects();
    effects.update(step, &mut ctx);

    state.particles.advance(step.dt);
    state.screen.advance(step.secs);
    state.player.sync_node(&mut state.scene, state.camera.focus_scale);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::assets::AssetRegistry;
    use crate::sim::scene::NodeKind;
    use crate::sim::state::SessionPhase;
    use crate::tuning::Tuning;

    fn frame() -> Step {
        Step::from_dt(1.0, REFERENCE_FRAME_MS)
    }

    fn playing() -> GameState {
        let mut state = GameState::new(Tuning::default(), 5).unwrap();
        state.assets = AssetRegistry::all_loaded();
        state.start();
        state
    }

    #[test]
    fn test_not_playing_is_frozen() {
        let mut state = GameState::new(Tuning::default(), 5).unwrap();
        let outcome = tick(&mut state, &TickInput { jump: true, ..Default::default() }, frame());
        assert_eq!(outcome, TickOutcome::default());
        assert_eq!(state.frame_count, 0);
    }

    #[test]
    fn test_standing_still_collides_with_first_obstacle() {
        let mut state = playing();
        let mut frames = 0;
        loop {
            let outcome = tick(&mut state, &TickInput::default(), frame());
            frames += 1;
            if outcome.collided {
                break;
            }
            assert!(frames < 200);
        }
        assert_eq!(state.phase, SessionPhase::GameOver);
        assert_eq!(state.score, 0);

        // Frozen after game over
        let x = state.obstacles.iter().next().unwrap().pos.x;
        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.obstacles.iter().next().unwrap().pos.x, x);
    }

    #[test]
    fn test_timed_jump_clears_obstacle_and_scores() {
        let mut state = playing();
        let mut total = 0;
        for _ in 0..200 {
            let obstacle_x = state.obstacles.iter().next().unwrap().pos.x;
            let distance = obstacle_x - state.player.x;
            let input = TickInput {
                jump: distance > 0.0 && distance < 2.4,
                ..Default::default()
            };
            let outcome = tick(&mut state, &input, frame());
            assert!(!outcome.collided, "hit at distance {distance}");
            total += outcome.passed;
        }
        assert_eq!(total as u64, state.score);
        assert!(state.score >= 1);
    }

    #[test]
    fn test_landing_kicks_up_dust() {
        let mut state = playing();
        tick(&mut state, &TickInput { jump: true, ..Default::default() }, frame());
        let mut landed = false;
        for _ in 0..60 {
            if tick(&mut state, &TickInput::default(), frame()).landed {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(
            state.particles.count_for(ParticleOwner::Ambient),
            state.tuning.particles.landing_dust
        );
    }

    #[test]
    fn test_effect_key_starts_key_effect_once() {
        let mut state = playing();
        let input = TickInput {
            activate_effect: true,
            ..Default::default()
        };
        let first = tick(&mut state, &input, frame());
        assert_eq!(first.started, vec![EffectKind::MultiPhaseZoom]);
        let second = tick(&mut state, &input, frame());
        assert!(second.started.is_empty());
        assert_eq!(state.scene.count_kind(NodeKind::ZoomHalo), 1);
    }
}
