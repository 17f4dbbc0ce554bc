//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through [`Step`]
//! - Seeded RNG only
//! - Stable iteration order
//! - No rendering or platform dependencies

pub mod assets;
pub mod clock;
pub mod collision;
pub mod effects;
pub mod obstacles;
pub mod particles;
pub mod physics;
pub mod scene;
pub mod state;
pub mod tick;

pub use assets::{AssetRegistry, TextureId};
pub use clock::{FrameClock, Step};
pub use collision::{Aabb, boxes_overlap, detect, first_hit};
pub use effects::{EffectKind, EffectOrchestrator, EffectPhase, TriggerOutcome, ZoomPhase};
pub use obstacles::{Obstacle, ObstacleField};
pub use particles::{ParticleOwner, ParticleSprite, ParticleSystem};
pub use physics::{Player, VerticalBody};
pub use scene::{Node, NodeHandle, NodeId, NodeKind, SceneChange, SceneGraph};
pub use state::{Camera, GameState, ScreenTint, SessionPhase};
pub use tick::{TickInput, TickOutcome, tick};
