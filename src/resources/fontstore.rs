//! Font store resource.
//!
//! Stores loaded bitmap fonts keyed by string IDs. Fonts are loaded during
//! setup and referenced by key in
//! [`DynamicText`](crate::components::dynamictext::DynamicText) components.
//! Fonts own display lists of the renderer they were created with; call
//! [`FontStore::release`] with that renderer before dropping it.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::font::BitmapFont;
use crate::render::RenderBackend;

/// Map of font keys to loaded fonts.
#[derive(Resource, Default)]
pub struct FontStore {
    fonts: FxHashMap<String, BitmapFont>,
}

impl FontStore {
    /// Create an empty font store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a font with the given key.
    pub fn add(&mut self, id: impl Into<String>, font: BitmapFont) {
        self.fonts.insert(id.into(), font);
    }

    /// Get a font by its key.
    pub fn get(&self, id: impl AsRef<str>) -> Option<&BitmapFont> {
        self.fonts.get(id.as_ref())
    }

    pub fn get_mut(&mut self, id: impl AsRef<str>) -> Option<&mut BitmapFont> {
        self.fonts.get_mut(id.as_ref())
    }

    /// Get the number of loaded fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Remove all fonts, freeing their display lists.
    pub fn release(&mut self, renderer: &mut dyn RenderBackend) {
        for (_, font) in self.fonts.drain() {
            font.release(renderer);
        }
    }
}
