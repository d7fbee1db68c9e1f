//! Animation resource registry.
//!
//! Animations are described as data ([`AnimationDef`], loadable from JSON)
//! against named sprite sheets. Each entity gets its own [`Animation`] built
//! from a definition, so playback state is never shared.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::animation::Animation;
use crate::error::{EngineError, EngineResult};
use crate::spritesheet::SpriteSheet;

fn default_true() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

/// One cell of a sheet shown for `duration_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDef {
    pub col: usize,
    pub row: usize,
    pub duration_ms: u32,
}

/// Data description of an animation over a sprite sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDef {
    /// Key of the sheet in the [`AnimationStore`].
    pub sheet: String,
    pub frames: Vec<FrameDef>,
    #[serde(default = "default_true")]
    pub looping: bool,
    #[serde(default)]
    pub ping_pong: bool,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub stop_at: Option<usize>,
}

/// Central registry of sprite sheets and animation definitions keyed by
/// string IDs.
#[derive(Resource, Default)]
pub struct AnimationStore {
    sheets: FxHashMap<String, Arc<SpriteSheet>>,
    animations: FxHashMap<String, AnimationDef>,
}

impl AnimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, key: impl Into<String>, sheet: SpriteSheet) -> Arc<SpriteSheet> {
        let sheet = Arc::new(sheet);
        self.sheets.insert(key.into(), sheet.clone());
        sheet
    }

    pub fn sheet(&self, key: &str) -> Option<&Arc<SpriteSheet>> {
        self.sheets.get(key)
    }

    pub fn add(&mut self, key: impl Into<String>, def: AnimationDef) {
        self.animations.insert(key.into(), def);
    }

    pub fn get(&self, key: &str) -> Option<&AnimationDef> {
        self.animations.get(key)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Add every definition of a JSON object `{ "key": AnimationDef, ... }`.
    /// Returns how many were added.
    pub fn load_json(&mut self, json: &str) -> Result<usize, String> {
        let defs: FxHashMap<String, AnimationDef> =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse animations: {}", e))?;
        let count = defs.len();
        self.animations.extend(defs);
        log::info!("Loaded {} animation definitions", count);
        Ok(count)
    }

    /// A fresh [`Animation`] for the definition `key`.
    pub fn build(&self, key: &str) -> EngineResult<Animation> {
        let def = self
            .animations
            .get(key)
            .ok_or_else(|| EngineError::Config(format!("unknown animation '{}'", key)))?;
        let sheet = self.sheets.get(&def.sheet).ok_or_else(|| {
            EngineError::Config(format!("animation '{}' uses unknown sheet '{}'", key, def.sheet))
        })?;

        let mut anim = Animation::with_sheet(sheet.clone());
        anim.set_speed(def.speed);
        for frame in &def.frames {
            anim.add_cell(frame.col, frame.row, frame.duration_ms)?;
        }
        anim.set_looping(def.looping);
        anim.set_ping_pong(def.ping_pong);
        if let Some(index) = def.stop_at {
            anim.stop_at(index);
        }
        Ok(anim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Image, Texture};

    const WALK: &str = r#"{
        "walk": {
            "sheet": "hero",
            "frames": [
                { "col": 0, "row": 0, "duration_ms": 100 },
                { "col": 1, "row": 0, "duration_ms": 120 }
            ],
            "ping_pong": true
        }
    }"#;

    fn store() -> AnimationStore {
        let mut store = AnimationStore::new();
        store.add_sheet(
            "hero",
            SpriteSheet::new(Image::new(Texture::exact(3, 64, 16)), 16, 16).unwrap(),
        );
        store
    }

    #[test]
    fn test_load_and_build() {
        let mut store = store();
        assert_eq!(store.load_json(WALK), Ok(1));
        let def = store.get("walk").unwrap();
        assert!(def.looping);
        assert_eq!(def.speed, 1.0);

        let anim = store.build("walk").unwrap();
        assert_eq!(anim.frame_count(), 2);
        assert_eq!(anim.durations(), vec![100, 120]);
        assert!(anim.is_ping_pong());
        assert_eq!(anim.image(1).unwrap().origin(), (16, 0));
    }

    #[test]
    fn test_builds_are_independent() {
        let mut store = store();
        store.load_json(WALK).unwrap();
        let mut a = store.build("walk").unwrap();
        let b = store.build("walk").unwrap();
        a.advance(150.0);
        assert_eq!(a.current_frame_index(), 1);
        assert_eq!(b.current_frame_index(), 0);
    }

    #[test]
    fn test_unknown_keys() {
        let mut store = store();
        assert!(store.build("run").is_err());
        store.add(
            "orphan",
            AnimationDef {
                sheet: "villain".to_string(),
                frames: vec![],
                looping: true,
                ping_pong: false,
                speed: 1.0,
                stop_at: None,
            },
        );
        assert!(matches!(store.build("orphan"), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_zero_duration_def_rejected() {
        let mut store = store();
        store
            .load_json(r#"{ "bad": { "sheet": "hero", "frames": [ { "col": 0, "row": 0, "duration_ms": 0 } ] } }"#)
            .unwrap();
        assert_eq!(store.build("bad").unwrap_err(), EngineError::InvalidDuration);
    }

    #[test]
    fn test_malformed_json() {
        let mut store = store();
        assert!(store.load_json("{ not json").is_err());
        assert!(store.is_empty());
    }
}
