//! Textures and image regions.
//!
//! A [`Texture`] is the handle the texture cache gives back once pixels are
//! resident on the GPU. An [`Image`] is a rectangle of a texture; sprite
//! sheet cells, glyphs and animation frames are all images of a shared
//! texture, and they know how to emit their own textured quad.

use crate::error::EngineResult;
use crate::render::{Color, Primitive, RenderBackend};

/// GPU texture metadata.
///
/// `tex_width`/`tex_height` are the allocated (power of two) dimensions,
/// `width`/`height` the image actually stored in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub tex_width: u32,
    pub tex_height: u32,
    pub has_alpha: bool,
}

impl Texture {
    /// Texture whose storage is rounded up to powers of two.
    pub fn new(id: u32, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            tex_width: width.max(1).next_power_of_two(),
            tex_height: height.max(1).next_power_of_two(),
            has_alpha: true,
        }
    }

    /// Texture whose storage matches the image exactly.
    pub fn exact(id: u32, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            tex_width: width.max(1),
            tex_height: height.max(1),
            has_alpha: true,
        }
    }

    pub fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }
}

/// A rectangular region of a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Image {
    texture: Texture,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Image {
    /// The whole stored image of a texture.
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            x: 0,
            y: 0,
            width: texture.width,
            height: texture.height,
        }
    }

    /// A region of this image, in pixels relative to its top-left corner.
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Image {
        Image {
            texture: self.texture,
            x: self.x + x,
            y: self.y + y,
            width,
            height,
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel position of the region inside its texture.
    pub fn origin(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Normalized texture coordinates `(u0, v0, u1, v1)` of the region.
    pub fn tex_coords(&self) -> (f32, f32, f32, f32) {
        let tw = self.texture.tex_width as f32;
        let th = self.texture.tex_height as f32;
        let u0 = self.x as f32 / tw;
        let v0 = self.y as f32 / th;
        (
            u0,
            v0,
            u0 + self.width as f32 / tw,
            v0 + self.height as f32 / th,
        )
    }

    pub fn bind(&self, renderer: &mut dyn RenderBackend) {
        renderer.bind_texture(self.texture.id);
    }

    /// Draw at natural size.
    pub fn draw(&self, renderer: &mut dyn RenderBackend, x: f32, y: f32, color: Color) -> EngineResult<()> {
        self.draw_sized(renderer, x, y, self.width as f32, self.height as f32, color)
    }

    /// Draw stretched to `width` x `height`.
    pub fn draw_sized(
        &self,
        renderer: &mut dyn RenderBackend,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    ) -> EngineResult<()> {
        self.bind(renderer);
        renderer.color(color);
        renderer.begin(Primitive::Quads)?;
        self.draw_embedded(renderer, x, y, width, height);
        renderer.end();
        Ok(())
    }

    /// Emit the quad's four vertices into an already open
    /// [`Primitive::Quads`] block, with this image's texture bound.
    pub fn draw_embedded(&self, renderer: &mut dyn RenderBackend, x: f32, y: f32, width: f32, height: f32) {
        let (u0, v0, u1, v1) = self.tex_coords();
        renderer.tex_coord(u0, v0);
        renderer.vertex(x, y, 0.0);
        renderer.tex_coord(u0, v1);
        renderer.vertex(x, y + height, 0.0);
        renderer.tex_coord(u1, v1);
        renderer.vertex(x + width, y + height, 0.0);
        renderer.tex_coord(u1, v0);
        renderer.vertex(x + width, y, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, Immediate, RecordingBackend};

    #[test]
    fn test_texture_rounds_to_power_of_two() {
        let t = Texture::new(1, 100, 60);
        assert_eq!((t.tex_width, t.tex_height), (128, 64));
    }

    #[test]
    fn test_sub_image_tex_coords() {
        let img = Image::new(Texture::exact(1, 64, 32));
        let sub = img.sub_image(16, 8, 16, 8);
        assert_eq!(sub.tex_coords(), (0.25, 0.25, 0.5, 0.5));
        let nested = sub.sub_image(8, 0, 8, 8);
        assert_eq!(nested.origin(), (24, 8));
    }

    #[test]
    fn test_draw_emits_textured_quad() {
        let img = Image::new(Texture::exact(9, 4, 4));
        let mut r = Immediate::new(RecordingBackend::new());
        img.draw(&mut r, 10.0, 20.0, Color::WHITE).unwrap();
        let cmds = r.driver().commands();
        assert_eq!(cmds[0], DrawCommand::BindTexture(9));
        assert_eq!(cmds[2], DrawCommand::Begin(Primitive::Quads));
        assert_eq!(cmds[3], DrawCommand::TexCoord([0.0, 0.0]));
        assert_eq!(cmds[4], DrawCommand::Vertex([10.0, 20.0, 0.0]));
        assert_eq!(cmds[8], DrawCommand::Vertex([14.0, 24.0, 0.0]));
        assert_eq!(cmds[9], DrawCommand::TexCoord([1.0, 0.0]));
        assert_eq!(cmds[10], DrawCommand::Vertex([14.0, 20.0, 0.0]));
        assert_eq!(cmds.last(), Some(&DrawCommand::End));
    }
}
