//! Timed visual effects
//!
//! The orchestrator owns every active effect, at most one per kind. Each
//! effect owns its scene nodes and particles; teardown releases them, cancels
//! the kind's scheduled actions and frees the slot for the next trigger.
//!
//! Staged transitions run through [`Schedule`], which is drained inside
//! [`EffectOrchestrator::update`]. Actions carry the generation of the
//! instance that queued them, so one that outlives its effect is ignored.

pub mod converge;
pub mod schedule;
pub mod secondary;
pub mod spiral;
pub mod zoom;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

pub use converge::{BurstConverge, ConvergePhase};
pub use schedule::{Pending, Schedule, ScheduledAction};
pub use secondary::{SecondaryBounce, SecondaryOscillate};
pub use spiral::SpiralDecals;
pub use zoom::{MultiPhaseZoom, ZoomPhase};

use super::assets::{AssetRegistry, TextureId};
use super::clock::Step;
use super::particles::{ParticleOwner, ParticleSprite, ParticleSystem};
use super::scene::SceneGraph;
use super::state::{Camera, ScreenTint};
use crate::tuning::EffectTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    SpiralDecals,
    BurstConverge,
    SecondaryBounce,
    SecondaryOscillate,
    MultiPhaseZoom,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::SpiralDecals,
        EffectKind::BurstConverge,
        EffectKind::SecondaryBounce,
        EffectKind::SecondaryOscillate,
        EffectKind::MultiPhaseZoom,
    ];

    /// Texture that must be loaded before this effect can spawn
    pub fn required_texture(self) -> Option<TextureId> {
        match self {
            EffectKind::SpiralDecals => Some(TextureId::Decal),
            EffectKind::SecondaryBounce | EffectKind::SecondaryOscillate => Some(TextureId::Actor),
            EffectKind::BurstConverge | EffectKind::MultiPhaseZoom => None,
        }
    }

    pub fn owner(self) -> ParticleOwner {
        ParticleOwner::Effect(self)
    }
}

/// Mutable world access handed to effects for one call
pub struct EffectCtx<'a> {
    pub scene: &'a mut SceneGraph,
    pub particles: &'a mut ParticleSystem,
    pub camera: &'a mut Camera,
    pub screen: &'a mut ScreenTint,
    pub rng: &'a mut Pcg32,
    pub assets: &'a AssetRegistry,
    /// Point of interest for camera effects (the player)
    pub focus: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectStatus {
    Running,
    Finished,
}

/// Result of a trigger attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    /// Same kind already running; the trigger was ignored
    AlreadyActive,
    /// Required texture not loaded yet; nothing was spawned
    MissingAsset,
}

/// Observable phase of an active effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectPhase {
    Spiraling,
    Converging,
    Merging,
    Bouncing,
    Oscillating,
    Zoom(ZoomPhase),
}

#[derive(Debug)]
enum Effect {
    Spiral(SpiralDecals),
    Converge(BurstConverge),
    Bounce(SecondaryBounce),
    Oscillate(SecondaryOscillate),
    Zoom(MultiPhaseZoom),
}

impl Effect {
    fn kind(&self) -> EffectKind {
        match self {
            Effect::Spiral(_) => EffectKind::SpiralDecals,
            Effect::Converge(_) => EffectKind::BurstConverge,
            Effect::Bounce(_) => EffectKind::SecondaryBounce,
            Effect::Oscillate(_) => EffectKind::SecondaryOscillate,
            Effect::Zoom(_) => EffectKind::MultiPhaseZoom,
        }
    }

    fn phase(&self) -> EffectPhase {
        match self {
            Effect::Spiral(_) => EffectPhase::Spiraling,
            Effect::Converge(c) => match c.phase() {
                ConvergePhase::Converging => EffectPhase::Converging,
                ConvergePhase::Merging => EffectPhase::Merging,
            },
            Effect::Bounce(_) => EffectPhase::Bouncing,
            Effect::Oscillate(_) => EffectPhase::Oscillating,
            Effect::Zoom(z) => EffectPhase::Zoom(z.phase()),
        }
    }

    fn update(&mut self, step: Step, elapsed: f32, ctx: &mut EffectCtx) -> EffectStatus {
        match self {
            Effect::Spiral(s) => {
                s.update(step.dt, ctx.scene);
                EffectStatus::Running
            }
            Effect::Converge(c) => c.update(step.dt, ctx.screen),
            Effect::Bounce(b) => {
                b.update(step.dt, ctx.scene);
                EffectStatus::Running
            }
            Effect::Oscillate(o) => {
                o.update(elapsed, ctx.scene);
                EffectStatus::Running
            }
            Effect::Zoom(z) => z.update(step.secs, elapsed, ctx),
        }
    }

    fn node_count(&self) -> usize {
        match self {
            Effect::Spiral(s) => s.node_count(),
            Effect::Converge(_) => 0,
            Effect::Bounce(_) => 2,
            Effect::Oscillate(_) | Effect::Zoom(_) => 1,
        }
    }

    fn teardown(self, ctx: &mut EffectCtx) {
        match self {
            Effect::Spiral(s) => s.teardown(ctx.scene),
            Effect::Converge(_) => {}
            Effect::Bounce(b) => b.teardown(ctx.scene),
            Effect::Oscillate(o) => o.teardown(ctx.scene),
            Effect::Zoom(z) => z.teardown(ctx),
        }
    }
}

#[derive(Debug)]
struct ActiveEffect {
    generation: u64,
    /// Orchestrator time at trigger (seconds)
    started_at: f32,
    effect: Effect,
}

#[derive(Debug)]
pub struct EffectOrchestrator {
    tuning: EffectTuning,
    active: Vec<ActiveEffect>,
    schedule: Schedule,
    generation: u64,
    /// Seconds since construction or the last `teardown_all`
    now: f32,
}

impl EffectOrchestrator {
    pub fn new(tuning: &EffectTuning) -> Self {
        Self {
            tuning: tuning.clone(),
            active: Vec::new(),
            schedule: Schedule::new(),
            generation: 0,
            now: 0.0,
        }
    }

    /// Start `kind` unless it is already running or its texture is missing
    pub fn trigger(&mut self, kind: EffectKind, ctx: &mut EffectCtx) -> TriggerOutcome {
        if self.is_active(kind) {
            log::debug!("Ignoring trigger for {:?}: already active", kind);
            return TriggerOutcome::AlreadyActive;
        }
        if let Some(texture) = kind.required_texture() {
            if !ctx.assets.is_loaded(texture) {
                log::debug!("Skipping {:?}: texture {:?} not loaded", kind, texture);
                return TriggerOutcome::MissingAsset;
            }
        }

        self.generation += 1;
        let generation = self.generation;
        let now = self.now;
        let effect = match kind {
            EffectKind::SpiralDecals => {
                let spiral = &self.tuning.spiral;
                self.schedule.after(now, spiral.duration_secs, kind, generation, ScheduledAction::Expire);
                Effect::Spiral(SpiralDecals::spawn(spiral, ctx))
            }
            EffectKind::BurstConverge => {
                let converge = &self.tuning.converge;
                self.schedule.after(
                    now,
                    converge.merge_delay_secs,
                    kind,
                    generation,
                    ScheduledAction::BeginMerge,
                );
                Effect::Converge(BurstConverge::spawn(converge, ctx.rng))
            }
            EffectKind::SecondaryBounce => {
                let secondary = &self.tuning.secondary;
                self.schedule.after(now, secondary.duration_secs, kind, generation, ScheduledAction::Expire);
                Effect::Bounce(SecondaryBounce::spawn(secondary, ctx.scene))
            }
            EffectKind::SecondaryOscillate => {
                let secondary = &self.tuning.secondary;
                self.schedule.after(now, secondary.duration_secs, kind, generation, ScheduledAction::Expire);
                Effect::Oscillate(SecondaryOscillate::spawn(secondary, ctx.scene))
            }
            EffectKind::MultiPhaseZoom => Effect::Zoom(MultiPhaseZoom::spawn(&self.tuning.zoom, ctx)),
        };

        log::info!("Effect {:?} started (generation {})", kind, generation);
        self.active.push(ActiveEffect {
            generation,
            started_at: now,
            effect,
        });
        TriggerOutcome::Started
    }

    /// Evaluate score rules for a new score; returns the kinds that started
    pub fn on_score(&mut self, score: u64, ctx: &mut EffectCtx) -> Vec<EffectKind> {
        if score == 0 {
            return Vec::new();
        }
        let due: Vec<EffectKind> = self
            .tuning
            .triggers
            .iter()
            .filter(|rule| rule.every > 0 && score % rule.every == 0)
            .map(|rule| rule.kind)
            .collect();

        due.into_iter()
            .filter(|&kind| self.trigger(kind, ctx) == TriggerOutcome::Started)
            .collect()
    }

    /// Advance time: fire due actions, step every effect, retire finished ones
    pub fn update(&mut self, step: Step, ctx: &mut EffectCtx) {
        self.now += step.secs;

        for pending in self.schedule.take_due(self.now) {
            self.dispatch(pending, ctx);
        }

        let now = self.now;
        let mut finished = Vec::new();
        for active in &mut self.active {
            let elapsed = now - active.started_at;
            if active.effect.update(step, elapsed, ctx) == EffectStatus::Finished {
                finished.push(active.effect.kind());
            }
        }
        for kind in finished {
            self.teardown(kind, ctx);
        }
    }

    /// Run one scheduled action if its effect instance is still alive
    pub(crate) fn dispatch(&mut self, pending: Pending, ctx: &mut EffectCtx) {
        let Some(index) = self
            .active
            .iter()
            .position(|a| a.effect.kind() == pending.kind && a.generation == pending.generation)
        else {
            log::trace!(
                "Dropping stale {:?} for {:?} (generation {})",
                pending.action,
                pending.kind,
                pending.generation
            );
            return;
        };

        match pending.action {
            ScheduledAction::BeginMerge => {
                if let Effect::Converge(converge) = &mut self.active[index].effect {
                    log::debug!("Converge merge phase begins");
                    converge.begin_merge();
                }
            }
            ScheduledAction::Expire => {
                self.teardown(pending.kind, ctx);
            }
        }
    }

    /// Tear down the active effect of `kind`. Returns false if none was active.
    pub fn teardown(&mut self, kind: EffectKind, ctx: &mut EffectCtx) -> bool {
        let Some(index) = self.active.iter().position(|a| a.effect.kind() == kind) else {
            return false;
        };
        let active = self.active.remove(index);
        let cancelled = self.schedule.cancel(kind);
        let cleared = ctx.particles.clear_owner(kind.owner());
        active.effect.teardown(ctx);
        log::info!(
            "Effect {:?} torn down ({} pending actions cancelled, {} particles cleared)",
            kind,
            cancelled,
            cleared
        );
        true
    }

    /// Force-teardown every active effect regardless of phase. Nothing is
    /// left scheduled afterwards, so the effect clock restarts at zero.
    pub fn teardown_all(&mut self, ctx: &mut EffectCtx) {
        for kind in self.active_kinds() {
            self.teardown(kind, ctx);
        }
        self.schedule.clear();
        self.now = 0.0;
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.active.iter().any(|a| a.effect.kind() == kind)
    }

    pub fn active_kinds(&self) -> Vec<EffectKind> {
        self.active.iter().map(|a| a.effect.kind()).collect()
    }

    pub fn phase(&self, kind: EffectKind) -> Option<EffectPhase> {
        self.find(kind).map(|a| a.effect.phase())
    }

    pub fn generation(&self, kind: EffectKind) -> Option<u64> {
        self.find(kind).map(|a| a.generation)
    }

    pub fn pending_count(&self) -> usize {
        self.schedule.len()
    }

    pub fn pending_for(&self, kind: EffectKind) -> usize {
        self.schedule.count_for(kind)
    }

    /// Scene nodes held by all active effects
    pub fn owned_nodes(&self) -> usize {
        self.active.iter().map(|a| a.effect.node_count()).sum()
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn converge(&self) -> Option<&BurstConverge> {
        self.active.iter().find_map(|a| match &a.effect {
            Effect::Converge(c) => Some(c),
            _ => None,
        })
    }

    pub fn zoom(&self) -> Option<&MultiPhaseZoom> {
        self.active.iter().find_map(|a| match &a.effect {
            Effect::Zoom(z) => Some(z),
            _ => None,
        })
    }

    /// Particles held directly by effects (not in the shared pool)
    pub fn sprites(&self) -> impl Iterator<Item = ParticleSprite> + '_ {
        self.converge().into_iter().flat_map(BurstConverge::sprites)
    }

    fn find(&self, kind: EffectKind) -> Option<&ActiveEffect> {
        self.active.iter().find(|a| a.effect.kind() == kind)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;
    use crate::consts::REFERENCE_FRAME_MS;

    fn frame() -> Step {
        Step::from_dt(1.0, REFERENCE_FRAME_MS)
    }

    fn orchestrator() -> EffectOrchestrator {
        EffectOrchestrator::new(&EffectTuning::default())
    }

    #[test]
    fn test_retrigger_is_ignored_without_duplicating_resources() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();

        assert_eq!(orch.trigger(EffectKind::SpiralDecals, &mut fx.ctx()), TriggerOutcome::Started);
        let nodes = fx.scene.len();
        let generation = orch.generation(EffectKind::SpiralDecals);

        orch.update(frame(), &mut fx.ctx());
        assert_eq!(
            orch.trigger(EffectKind::SpiralDecals, &mut fx.ctx()),
            TriggerOutcome::AlreadyActive
        );
        assert_eq!(fx.scene.len(), nodes);
        assert_eq!(orch.generation(EffectKind::SpiralDecals), generation);
        assert_eq!(orch.pending_for(EffectKind::SpiralDecals), 1);
    }

    #[test]
    fn test_missing_texture_is_a_no_op() {
        let mut fx = Fixture::new();
        fx.assets = AssetRegistry::new();
        let mut orch = orchestrator();

        for kind in [
            EffectKind::SpiralDecals,
            EffectKind::SecondaryBounce,
            EffectKind::SecondaryOscillate,
        ] {
            assert_eq!(orch.trigger(kind, &mut fx.ctx()), TriggerOutcome::MissingAsset);
            assert!(!orch.is_active(kind));
        }
        assert!(fx.scene.is_empty());
        assert_eq!(orch.pending_count(), 0);

        // Next trigger after the texture arrives succeeds
        fx.assets.mark_loaded(TextureId::Decal);
        assert_eq!(orch.trigger(EffectKind::SpiralDecals, &mut fx.ctx()), TriggerOutcome::Started);
    }

    #[test]
    fn test_stale_generation_action_is_ignored() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();

        orch.trigger(EffectKind::BurstConverge, &mut fx.ctx());
        let old = orch.generation(EffectKind::BurstConverge).unwrap();
        assert!(orch.teardown(EffectKind::BurstConverge, &mut fx.ctx()));
        assert_eq!(orch.pending_count(), 0);

        orch.trigger(EffectKind::BurstConverge, &mut fx.ctx());
        let stale = Pending {
            due: 0.0,
            kind: EffectKind::BurstConverge,
            generation: old,
            action: ScheduledAction::BeginMerge,
        };
        orch.dispatch(stale, &mut fx.ctx());
        assert_eq!(orch.phase(EffectKind::BurstConverge), Some(EffectPhase::Converging));

        let stale_expire = Pending {
            action: ScheduledAction::Expire,
            ..stale
        };
        orch.dispatch(stale_expire, &mut fx.ctx());
        assert!(orch.is_active(EffectKind::BurstConverge));
    }

    #[test]
    fn test_teardown_all_mid_phase_releases_everything() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();
        let camera = fx.camera;

        for kind in EffectKind::ALL {
            assert_eq!(orch.trigger(kind, &mut fx.ctx()), TriggerOutcome::Started);
        }
        for _ in 0..40 {
            orch.update(frame(), &mut fx.ctx());
        }
        assert_eq!(orch.active_kinds().len(), 5);
        assert!(orch.owned_nodes() > 0);
        assert!(fx.particles.count_for(EffectKind::MultiPhaseZoom.owner()) > 0);

        orch.teardown_all(&mut fx.ctx());
        assert!(orch.active_kinds().is_empty());
        assert_eq!(orch.owned_nodes(), 0);
        assert_eq!(orch.pending_count(), 0);
        assert!(fx.scene.is_empty());
        assert_eq!(fx.particles.live_count(), 0);
        assert_eq!(orch.sprites().count(), 0);
        assert_eq!(fx.camera, camera);
    }

    #[test]
    fn test_spiral_expires_after_duration() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();
        orch.trigger(EffectKind::SpiralDecals, &mut fx.ctx());

        let duration = EffectTuning::default().spiral.duration_secs;
        let frames = (duration / frame().secs).ceil() as usize + 1;
        for _ in 0..frames {
            orch.update(frame(), &mut fx.ctx());
        }
        assert!(!orch.is_active(EffectKind::SpiralDecals));
        assert!(fx.scene.is_empty());
        assert_eq!(orch.pending_count(), 0);
    }

    #[test]
    fn test_secondary_effects_expire_after_duration() {
        use crate::sim::scene::NodeKind;

        let mut fx = Fixture::new();
        let mut orch = orchestrator();
        orch.trigger(EffectKind::SecondaryBounce, &mut fx.ctx());
        orch.trigger(EffectKind::SecondaryOscillate, &mut fx.ctx());
        assert_eq!(fx.scene.count_kind(NodeKind::BounceActor), 1);
        assert_eq!(fx.scene.count_kind(NodeKind::BouncePlatform), 1);
        assert_eq!(fx.scene.count_kind(NodeKind::OscillateActor), 1);

        let duration = EffectTuning::default().secondary.duration_secs;
        let frames = (duration / frame().secs).ceil() as usize + 1;
        for _ in 0..frames {
            orch.update(frame(), &mut fx.ctx());
        }
        assert!(!orch.is_active(EffectKind::SecondaryBounce));
        assert!(!orch.is_active(EffectKind::SecondaryOscillate));
        assert_eq!(orch.owned_nodes(), 0);
        assert_eq!(orch.pending_count(), 0);
        assert_eq!(fx.scene.count_kind(NodeKind::BounceActor), 0);
        assert_eq!(fx.scene.count_kind(NodeKind::BouncePlatform), 0);
        assert_eq!(fx.scene.count_kind(NodeKind::OscillateActor), 0);
    }

    #[test]
    fn test_teardown_all_restarts_effect_clock() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();
        for _ in 0..120 {
            orch.update(frame(), &mut fx.ctx());
        }
        assert!(orch.now() > 0.0);

        orch.teardown_all(&mut fx.ctx());
        assert_eq!(orch.now(), 0.0);

        // Deadlines scheduled after the reset still fire on time
        orch.trigger(EffectKind::SpiralDecals, &mut fx.ctx());
        let duration = EffectTuning::default().spiral.duration_secs;
        let frames = (duration / frame().secs).ceil() as usize + 1;
        for _ in 0..frames {
            orch.update(frame(), &mut fx.ctx());
        }
        assert!(!orch.is_active(EffectKind::SpiralDecals));
    }

    #[test]
    fn test_converge_runs_to_merge_and_tears_down() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();
        orch.trigger(EffectKind::BurstConverge, &mut fx.ctx());

        let mut saw_merge = false;
        let mut frames = 0;
        while orch.is_active(EffectKind::BurstConverge) {
            orch.update(frame(), &mut fx.ctx());
            saw_merge |= orch.phase(EffectKind::BurstConverge) == Some(EffectPhase::Merging);
            frames += 1;
            assert!(frames < 1000, "converge never finished");
        }

        let tuning = EffectTuning::default().converge;
        assert!(saw_merge);
        assert!(frames as f32 * frame().secs >= tuning.merge_delay_secs);
        assert!(fx.screen.is_transitioning());
        assert_eq!(orch.pending_count(), 0);
        assert_eq!(orch.sprites().count(), 0);
    }

    #[test]
    fn test_score_rules_fire_on_multiples() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();

        assert!(orch.on_score(0, &mut fx.ctx()).is_empty());
        assert!(orch.on_score(7, &mut fx.ctx()).is_empty());

        let started = orch.on_score(50, &mut fx.ctx());
        assert_eq!(started, vec![EffectKind::SpiralDecals, EffectKind::BurstConverge]);
        assert!(!orch.is_active(EffectKind::SecondaryBounce));

        // Already running: nothing new starts
        assert!(orch.on_score(50, &mut fx.ctx()).is_empty());
    }

    #[test]
    fn test_retrigger_after_teardown_gets_new_generation() {
        let mut fx = Fixture::new();
        let mut orch = orchestrator();
        orch.trigger(EffectKind::SecondaryOscillate, &mut fx.ctx());
        let first = orch.generation(EffectKind::SecondaryOscillate).unwrap();
        orch.teardown(EffectKind::SecondaryOscillate, &mut fx.ctx());
        assert!(!orch.teardown(EffectKind::SecondaryOscillate, &mut fx.ctx()));

        orch.trigger(EffectKind::SecondaryOscillate, &mut fx.ctx());
        assert!(orch.generation(EffectKind::SecondaryOscillate).unwrap() > first);
        assert_eq!(fx.scene.count_kind(crate::sim::scene::NodeKind::OscillateActor), 1);
    }
}
