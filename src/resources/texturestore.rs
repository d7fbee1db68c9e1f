//! Texture store resource.
//!
//! Textures are uploaded by the platform layer and registered here. The same
//! source can be loaded several times with different transform flags (a
//! flipped copy, a nearest-filtered copy), so entries are keyed by
//! `(name, TextureFlags)`.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::image::Texture;

/// Transform flags a texture was loaded with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureFlags {
    pub flipped: bool,
    pub nearest: bool,
}

impl TextureFlags {
    pub const NONE: TextureFlags = TextureFlags {
        flipped: false,
        nearest: false,
    };
}

#[derive(Resource, Default)]
pub struct TextureStore {
    map: FxHashMap<(String, TextureFlags), Texture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture. Returns the texture previously stored under the
    /// same key, if any.
    pub fn insert(&mut self, name: impl Into<String>, flags: TextureFlags, texture: Texture) -> Option<Texture> {
        self.map.insert((name.into(), flags), texture)
    }

    pub fn get(&self, name: &str, flags: TextureFlags) -> Option<&Texture> {
        self.map.get(&(name.to_string(), flags))
    }

    /// The texture loaded without transform flags.
    pub fn get_plain(&self, name: &str) -> Option<&Texture> {
        self.get(name, TextureFlags::NONE)
    }

    /// Cached texture for the key, loading it with `load` on first request.
    pub fn get_or_load<F>(&mut self, name: &str, flags: TextureFlags, load: F) -> Result<Texture, String>
    where
        F: FnOnce() -> Result<Texture, String>,
    {
        let key = (name.to_string(), flags);
        if let Some(texture) = self.map.get(&key) {
            return Ok(*texture);
        }
        let texture = load().map_err(|e| format!("Failed to load texture '{}': {}", name, e))?;
        log::debug!(
            "Loaded texture '{}' ({}x{}, {:?})",
            name,
            texture.width,
            texture.height,
            flags
        );
        self.map.insert(key, texture);
        Ok(texture)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_part_of_key() {
        let mut store = TextureStore::new();
        store.insert("hero", TextureFlags::NONE, Texture::exact(1, 32, 32));
        let flipped = TextureFlags {
            flipped: true,
            ..TextureFlags::NONE
        };
        store.insert("hero", flipped, Texture::exact(2, 32, 32));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_plain("hero").map(|t| t.id), Some(1));
        assert_eq!(store.get("hero", flipped).map(|t| t.id), Some(2));
    }

    #[test]
    fn test_get_or_load_loads_once() {
        let mut store = TextureStore::new();
        let mut loads = 0;
        for _ in 0..3 {
            let t = store
                .get_or_load("tiles", TextureFlags::NONE, || {
                    loads += 1;
                    Ok(Texture::new(7, 100, 100))
                })
                .unwrap();
            assert_eq!(t.tex_width, 128);
        }
        assert_eq!(loads, 1);
    }

    #[test]
    fn test_load_error_carries_name() {
        let mut store = TextureStore::new();
        let err = store
            .get_or_load("missing", TextureFlags::NONE, || Err("no such file".to_string()))
            .unwrap_err();
        assert!(err.contains("missing"));
        assert!(store.is_empty());
    }
}
