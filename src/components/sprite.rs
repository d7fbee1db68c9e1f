use bevy_ecs::prelude::Component;

use crate::render::Color;

/// Sprite is identified by a texture key and its size in world units.
///
/// When the entity also carries an [`Animation`](crate::components::animation::Animation)
/// the current frame is drawn instead of the whole texture. The origin is the
/// pivot (in pixels, from the top-left) that sits on the entity's
/// [`MapPosition`](crate::components::mapposition::MapPosition).
#[derive(Component, Clone, Debug)]
pub struct Sprite {
    pub tex_key: String,
    pub width: f32,
    pub height: f32,
    pub origin: (f32, f32),
    pub flip_h: bool,
    pub flip_v: bool,
    pub tint: Color,
}

impl Sprite {
    pub fn new(tex_key: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            tex_key: tex_key.into(),
            width,
            height,
            origin: (0.0, 0.0),
            flip_h: false,
            flip_v: false,
            tint: Color::WHITE,
        }
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    /// Destination rectangle `(x, y, w, h)` for a sprite pivoted at `(px, py)`.
    /// Flipped axes get a negative extent starting from the far edge, which
    /// mirrors the quad without touching its texture coordinates.
    pub fn dest_rect(&self, px: f32, py: f32) -> (f32, f32, f32, f32) {
        let mut x = px - self.origin.0;
        let mut y = py - self.origin.1;
        let mut w = self.width;
        let mut h = self.height;
        if self.flip_h {
            x += w;
            w = -w;
        }
        if self.flip_v {
            y += h;
            h = -h;
        }
        (x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_rect_applies_origin() {
        let s = Sprite::new("ship", 32.0, 16.0).with_origin(16.0, 8.0);
        assert_eq!(s.dest_rect(100.0, 50.0), (84.0, 42.0, 32.0, 16.0));
    }

    #[test]
    fn test_dest_rect_flips() {
        let mut s = Sprite::new("ship", 32.0, 16.0);
        s.flip_h = true;
        assert_eq!(s.dest_rect(0.0, 0.0), (32.0, 0.0, -32.0, 16.0));
        s.flip_v = true;
        assert_eq!(s.dest_rect(0.0, 0.0), (32.0, 16.0, -32.0, -16.0));
    }
}
