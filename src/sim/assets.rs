//! Texture availability
//!
//! Loading happens outside the simulation; the front end marks textures ready
//! and effects that need one skip spawning until it is.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextureId {
    Player,
    Decal,
    Actor,
}

#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    loaded: BTreeSet<TextureId>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every texture ready (headless runs and tests)
    pub fn all_loaded() -> Self {
        let mut assets = Self::new();
        for id in [TextureId::Player, TextureId::Decal, TextureId::Actor] {
            assets.mark_loaded(id);
        }
        assets
    }

    pub fn mark_loaded(&mut self, id: TextureId) {
        if self.loaded.insert(id) {
            log::info!("Texture ready: {:?}", id);
        }
    }

    pub fn is_loaded(&self, id: TextureId) -> bool {
        self.loaded.contains(&id)
    }
}
