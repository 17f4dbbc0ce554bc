//! Game session
//!
//! Sequences NotStarted -> Playing -> GameOver -> Playing around a
//! [`GameState`], turns wall-clock timestamps into frame steps and maps
//! front-end input to core signals.

use crate::sim::{
    EffectKind, FrameClock, GameState, SessionPhase, TickInput, TickOutcome, TriggerOutcome, tick,
};
use crate::tuning::{Tuning, TuningError};

/// Normalized input from the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSignal {
    /// Pointer down or touch start
    Pointer,
    /// Dedicated effect key
    ActivateEffect,
}

/// Whether the front end should request another animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// What the DOM overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiView {
    pub score: u64,
    pub show_start_prompt: bool,
    /// Final score while the game-over panel is up
    pub game_over: Option<u64>,
}

#[derive(Debug)]
pub struct Session {
    state: GameState,
    clock: FrameClock,
    /// Signals queued for the next frame
    input: TickInput,
}

impl Session {
    /// `seed` is used unless the tuning pins one. Fails on invalid tuning.
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        let seed = tuning.seed.unwrap_or(seed);
        let clock = FrameClock::new(&tuning.clock);
        let state = GameState::new(tuning, seed)?;
        log::info!("Session created with seed {}", seed);
        Ok(Self {
            state,
            clock,
            input: TickInput::default(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    /// Route a front-end signal. Returns true when the frame loop has to be
    /// (re)started because the session just entered Playing.
    pub fn handle(&mut self, signal: InputSignal) -> bool {
        match (signal, self.state.phase) {
            (InputSignal::Pointer, SessionPhase::NotStarted | SessionPhase::GameOver) => {
                self.start();
                true
            }
            (InputSignal::Pointer, SessionPhase::Playing) => {
                self.input.jump = true;
                false
            }
            (InputSignal::ActivateEffect, SessionPhase::Playing) => {
                self.input.activate_effect = true;
                false
            }
            (InputSignal::ActivateEffect, _) => false,
        }
    }

    /// Full reset into Playing
    pub fn start(&mut self) {
        self.state.start();
        self.clock.restart();
        self.input = TickInput::default();
    }

    /// Immediate jump, bypassing the input queue
    pub fn jump(&mut self) -> bool {
        self.state.jump()
    }

    /// Fire the key-bound effect right away
    pub fn trigger_named_effect(&mut self) -> Option<TriggerOutcome> {
        let kind: EffectKind = self.state.tuning.effects.key_effect;
        self.state.trigger_effect(kind)
    }

    /// Playing -> GameOver; ignored in any other phase
    pub fn report_collision(&mut self) -> bool {
        let ended = self.state.game_over();
        if ended {
            self.input = TickInput::default();
        }
        ended
    }

    /// Run one display frame at `now_ms`
    pub fn frame(&mut self, now_ms: f64) -> LoopControl {
        if !self.state.is_playing() {
            return LoopControl::Stop;
        }
        let step = self.clock.advance(now_ms);
        self.run(step);
        if self.state.is_playing() {
            LoopControl::Continue
        } else {
            LoopControl::Stop
        }
    }

    /// Run one frame of `dt` normalized units (headless and tests)
    pub fn step(&mut self, dt: f32) -> TickOutcome {
        let step = self.clock.step(dt);
        self.run(step)
    }

    fn run(&mut self, step: crate::sim::Step) -> TickOutcome {
        let input = std::mem::take(&mut self.input);
        let outcome = tick(&mut self.state, &input, step);
        for kind in &outcome.started {
            log::info!("Score {}: {:?} triggered", self.state.score, kind);
        }
        outcome
    }

    pub fn ui(&self) -> UiView {
        UiView {
            score: self.state.score,
            show_start_prompt: self.state.phase == SessionPhase::NotStarted,
            game_over: (self.state.phase == SessionPhase::GameOver).then_some(self.state.score),
        }
    }
}
