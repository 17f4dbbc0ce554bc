//! Frame clock
//!
//! Converts wall-clock frame timestamps into a normalized delta where `1.0`
//! is one reference frame (~60 Hz).

use crate::tuning::ClockTuning;

/// Time advanced by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Normalized frame delta (1.0 at the reference interval)
    pub dt: f32,
    /// The same delta in seconds
    pub secs: f32,
}

impl Step {
    pub const ZERO: Step = Step { dt: 0.0, secs: 0.0 };

    /// Build a step from a normalized delta
    pub fn from_dt(dt: f32, reference_frame_ms: f32) -> Self {
        Self {
            dt,
            secs: dt * reference_frame_ms / 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    reference_frame_ms: f32,
    max_dt: f32,
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(tuning: &ClockTuning) -> Self {
        Self {
            reference_frame_ms: tuning.reference_frame_ms,
            max_dt: tuning.max_dt,
            last_ms: None,
        }
    }

    /// Forget the previous timestamp; the next frame yields `dt == 0`
    pub fn restart(&mut self) {
        self.last_ms = None;
    }

    /// Advance to `now_ms` and return the normalized delta since the last call
    pub fn advance(&mut self, now_ms: f64) -> Step {
        let elapsed_ms = match self.last_ms {
            Some(last) => (now_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);

        let dt = (elapsed_ms / self.reference_frame_ms).min(self.max_dt);
        self.step(dt)
    }

    /// A step of `dt` normalized frames, clamped like a wall-clock frame
    pub fn step(&self, dt: f32) -> Step {
        Step::from_dt(dt.clamp(0.0, self.max_dt), self.reference_frame_ms)
    }
}
