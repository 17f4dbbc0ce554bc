//! One-shot delayed actions, evaluated inside the frame loop
//!
//! Each action is tagged with the effect kind and the generation of the
//! instance that scheduled it. Teardown cancels by kind; anything that still
//! slips through is dropped by the generation check in the orchestrator.

use super::EffectKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Start the merge sub-phase of a converge burst
    BeginMerge,
    /// End an effect that does not terminate on its own
    Expire,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pending {
    pub due: f32,
    pub kind: EffectKind,
    pub generation: u64,
    pub action: ScheduledAction,
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pending: Vec<Pending>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire once `delay` seconds after `now`
    pub fn after(&mut self, now: f32, delay: f32, kind: EffectKind, generation: u64, action: ScheduledAction) {
        self.pending.push(Pending {
            due: now + delay,
            kind,
            generation,
            action,
        });
    }

    /// Drop every pending action for `kind`; returns how many were dropped
    pub fn cancel(&mut self, kind: EffectKind) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.kind != kind);
        before - self.pending.len()
    }

    /// Remove and return every action due at `now`, earliest first
    pub fn take_due(&mut self, now: f32) -> Vec<Pending> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.due.total_cmp(&b.due));
        due
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn count_for(&self, kind: EffectKind) -> usize {
        self.pending.iter().filter(|p| p.kind == kind).count()
    }
}
