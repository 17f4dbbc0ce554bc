//! Multi-phase zoom and burst sequence
//!
//! Cycles ZoomIn, BurstA, ZoomOut, ZoomInAgain, BurstB until the overall
//! budget runs out. Teardown restores the camera it found at trigger time.

use glam::{Vec2, Vec3};

use super::{EffectCtx, EffectKind, EffectStatus};
use crate::sim::scene::{NodeHandle, NodeKind};
use crate::sim::state::Camera;
use crate::tuning::ZoomTuning;

const BURST_TINT: Vec3 = Vec3::new(1.0, 0.55, 0.9);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomPhase {
    ZoomIn,
    BurstA,
    ZoomOut,
    ZoomInAgain,
    BurstB,
}

impl ZoomPhase {
    pub fn next(self) -> Self {
        match self {
            ZoomPhase::ZoomIn => ZoomPhase::BurstA,
            ZoomPhase::BurstA => ZoomPhase::ZoomOut,
            ZoomPhase::ZoomOut => ZoomPhase::ZoomInAgain,
            ZoomPhase::ZoomInAgain => ZoomPhase::BurstB,
            ZoomPhase::BurstB => ZoomPhase::ZoomIn,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn is_burst(self) -> bool {
        matches!(self, ZoomPhase::BurstA | ZoomPhase::BurstB)
    }
}

#[derive(Debug)]
pub struct MultiPhaseZoom {
    tuning: ZoomTuning,
    phase: ZoomPhase,
    /// Seconds spent in the current phase
    phase_elapsed: f32,
    /// Burst already fired during this visit
    fired: bool,
    original: Camera,
    /// Camera at the start of the current phase
    from: Camera,
    halo: NodeHandle,
    bursts_fired: u32,
    history: Vec<ZoomPhase>,
}

impl MultiPhaseZoom {
    pub fn spawn(tuning: &ZoomTuning, ctx: &mut EffectCtx) -> Self {
        let halo = ctx.scene.spawn(NodeKind::ZoomHalo, ctx.focus.extend(-0.3), tuning.halo_size);
        Self {
            tuning: tuning.clone(),
            phase: ZoomPhase::ZoomIn,
            phase_elapsed: 0.0,
            fired: false,
            original: *ctx.camera,
            from: *ctx.camera,
            halo,
            bursts_fired: 0,
            history: vec![ZoomPhase::ZoomIn],
        }
    }

    /// Step by `secs`; `elapsed` is the time since trigger
    pub fn update(&mut self, secs: f32, elapsed: f32, ctx: &mut EffectCtx) -> EffectStatus {
        if elapsed > self.tuning.budget_secs {
            log::debug!("Zoom sequence budget spent after {:.2}s", elapsed);
            return EffectStatus::Finished;
        }

        self.phase_elapsed += secs;
        loop {
            self.apply(ctx);
            let duration = self.tuning.phase_secs[self.phase.index()];
            if self.phase_elapsed < duration {
                break;
            }
            self.phase_elapsed -= duration;
            self.enter(self.phase.next(), *ctx.camera);
        }

        if let Some(node) = ctx.scene.node_mut(&self.halo) {
            node.pos = ctx.focus.extend(-0.3);
            node.scale = self.tuning.halo_size * ctx.camera.focus_scale;
        }
        EffectStatus::Running
    }

    fn enter(&mut self, phase: ZoomPhase, camera: Camera) {
        self.phase = phase;
        self.fired = false;
        self.from = camera;
        self.history.push(phase);
    }

    fn target(&self) -> Option<Camera> {
        match self.phase {
            ZoomPhase::ZoomIn | ZoomPhase::ZoomInAgain => Some(Camera {
                zoom: self.tuning.camera_zoom,
                focus_scale: self.tuning.target_scale,
            }),
            ZoomPhase::ZoomOut => Some(self.original),
            ZoomPhase::BurstA | ZoomPhase::BurstB => None,
        }
    }

    fn apply(&mut self, ctx: &mut EffectCtx) {
        if let Some(target) = self.target() {
            let duration = self.tuning.phase_secs[self.phase.index()];
            let t = (self.phase_elapsed / duration).min(1.0);
            *ctx.camera = self.from.lerp(target, t);
        } else if !self.fired {
            self.fired = true;
            self.bursts_fired += 1;
            let origin: Vec2 = ctx.focus;
            ctx.particles.spawn_burst(
                origin,
                self.tuning.burst_count,
                EffectKind::MultiPhaseZoom.owner(),
                BURST_TINT,
                ctx.rng,
            );
        }
    }

    pub fn phase(&self) -> ZoomPhase {
        self.phase
    }

    pub fn bursts_fired(&self) -> u32 {
        self.bursts_fired
    }

    /// Every phase entered so far, in order
    pub fn history(&self) -> &[ZoomPhase] {
        &self.history
    }

    pub fn teardown(self, ctx: &mut EffectCtx) {
        *ctx.camera = self.original;
        ctx.scene.release(self.halo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::Fixture;

    const FRAME_SECS: f32 = 0.0167;

    fn run_until_finished(zoom: &mut MultiPhaseZoom, fx: &mut Fixture, secs: f32) -> f32 {
        let mut elapsed = 0.0;
        loop {
            elapsed += secs;
            if zoom.update(secs, elapsed, &mut fx.ctx()) == EffectStatus::Finished {
                return elapsed;
            }
            assert!(elapsed < 100.0);
        }
    }

    #[test]
    fn test_phases_cycle_in_order() {
        let mut fx = Fixture::new();
        let mut zoom = MultiPhaseZoom::spawn(&ZoomTuning::default(), &mut fx.ctx());
        run_until_finished(&mut zoom, &mut fx, FRAME_SECS);

        let expected = [
            ZoomPhase::ZoomIn,
            ZoomPhase::BurstA,
            ZoomPhase::ZoomOut,
            ZoomPhase::ZoomInAgain,
            ZoomPhase::BurstB,
        ];
        for (i, phase) in zoom.history().iter().enumerate() {
            assert_eq!(*phase, expected[i % 5]);
        }
        // 6s budget over a 2.3s cycle loops at least twice
        assert!(zoom.history().len() > 10);
        zoom.teardown(&mut fx.ctx());
    }

    #[test]
    fn test_each_burst_visit_fires_once() {
        let mut fx = Fixture::new();
        let tuning = ZoomTuning::default();
        let mut zoom = MultiPhaseZoom::spawn(&tuning, &mut fx.ctx());
        run_until_finished(&mut zoom, &mut fx, FRAME_SECS);

        let visits = zoom.history().iter().filter(|p| p.is_burst()).count() as u32;
        assert_eq!(zoom.bursts_fired(), visits);
        assert_eq!(
            fx.particles.count_for(EffectKind::MultiPhaseZoom.owner()),
            visits as usize * tuning.burst_count
        );
        zoom.teardown(&mut fx.ctx());
    }

    #[test]
    fn test_large_step_still_visits_every_phase() {
        let mut fx = Fixture::new();
        let mut zoom = MultiPhaseZoom::spawn(&ZoomTuning::default(), &mut fx.ctx());
        // One step covering the whole first cycle
        zoom.update(2.35, 2.35, &mut fx.ctx());
        assert_eq!(zoom.bursts_fired(), 2);
        assert_eq!(zoom.phase(), ZoomPhase::ZoomIn);
        assert_eq!(zoom.history().len(), 6);
        zoom.teardown(&mut fx.ctx());
    }

    #[test]
    fn test_zoom_in_reaches_target_then_budget_restores_camera() {
        let mut fx = Fixture::new();
        let tuning = ZoomTuning::default();
        let original = fx.camera;
        let mut zoom = MultiPhaseZoom::spawn(&tuning, &mut fx.ctx());

        zoom.update(0.49, 0.49, &mut fx.ctx());
        assert_eq!(zoom.phase(), ZoomPhase::ZoomIn);
        assert!(fx.camera.zoom > original.zoom);
        zoom.update(0.02, 0.51, &mut fx.ctx());
        assert_eq!(zoom.phase(), ZoomPhase::BurstA);
        assert_eq!(fx.camera.zoom, tuning.camera_zoom);
        assert_eq!(fx.camera.focus_scale, tuning.target_scale);

        let elapsed = run_until_finished(&mut zoom, &mut fx, FRAME_SECS);
        assert!(elapsed > tuning.budget_secs);
        zoom.teardown(&mut fx.ctx());
        assert_eq!(fx.camera, original);
        assert!(fx.scene.is_empty());
    }
}
