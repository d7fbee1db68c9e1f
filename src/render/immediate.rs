//! Direct-mode renderer.
//!
//! Forwards every call to the wrapped driver as it arrives. The only things
//! it adds are the global alpha scale and the no-context probe on `begin`.

use crate::error::{EngineError, EngineResult};

use super::{BlendMode, Color, ListMode, Primitive, RenderBackend, ScissorRect, VertexArrays};

pub struct Immediate<B> {
    driver: B,
    alpha_scale: f32,
}

impl<B: RenderBackend> Immediate<B> {
    pub fn new(driver: B) -> Self {
        Self {
            driver,
            alpha_scale: 1.0,
        }
    }

    pub fn driver(&self) -> &B {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut B {
        &mut self.driver
    }

    pub fn into_driver(self) -> B {
        self.driver
    }
}

impl<B: RenderBackend> RenderBackend for Immediate<B> {
    fn has_context(&self) -> bool {
        self.driver.has_context()
    }

    fn begin(&mut self, primitive: Primitive) -> EngineResult<()> {
        if !self.driver.has_context() {
            log::error!("begin({:?}) called with no render context", primitive);
            return Err(EngineError::NoRenderContext);
        }
        self.driver.begin(primitive)
    }

    fn end(&mut self) {
        self.driver.end();
    }

    fn vertex(&mut self, x: f32, y: f32, z: f32) {
        self.driver.vertex(x, y, z);
    }

    fn color(&mut self, color: Color) {
        self.driver.color(color.scale_alpha(self.alpha_scale));
    }

    fn tex_coord(&mut self, u: f32, v: f32) {
        self.driver.tex_coord(u, v);
    }

    fn draw_arrays(&mut self, primitive: Primitive, arrays: VertexArrays<'_>) {
        self.driver.draw_arrays(primitive, arrays);
    }

    fn bind_texture(&mut self, texture: u32) {
        self.driver.bind_texture(texture);
    }

    fn blend_mode(&mut self, mode: BlendMode) {
        self.driver.blend_mode(mode);
    }

    fn push_matrix(&mut self) {
        self.driver.push_matrix();
    }

    fn pop_matrix(&mut self) {
        self.driver.pop_matrix();
    }

    fn load_identity(&mut self) {
        self.driver.load_identity();
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.driver.translate(x, y, z);
    }

    fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        self.driver.rotate(angle, x, y, z);
    }

    fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.driver.scale(x, y, z);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.driver.viewport(x, y, width, height);
    }

    fn scissor(&mut self, rect: Option<ScissorRect>) {
        self.driver.scissor(rect);
    }

    fn line_width(&mut self, width: f32) {
        self.driver.line_width(width);
    }

    fn clear_color(&mut self, color: Color) {
        self.driver.clear_color(color);
    }

    fn clear(&mut self) {
        self.driver.clear();
    }

    fn gen_lists(&mut self, count: u32) -> u32 {
        self.driver.gen_lists(count)
    }

    fn new_list(&mut self, handle: u32, mode: ListMode) {
        self.driver.new_list(handle, mode);
    }

    fn end_list(&mut self) {
        self.driver.end_list();
    }

    fn call_list(&mut self, handle: u32) {
        self.driver.call_list(handle);
    }

    fn delete_lists(&mut self, base: u32, count: u32) {
        self.driver.delete_lists(base, count);
    }

    fn set_global_alpha_scale(&mut self, scale: f32) {
        self.alpha_scale = scale;
    }

    fn global_alpha_scale(&self) -> f32 {
        self.alpha_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingBackend};

    #[test]
    fn test_alpha_scale_applied_to_color() {
        let mut r = Immediate::new(RecordingBackend::new());
        r.set_global_alpha_scale(0.5);
        r.color(Color::new(1.0, 1.0, 1.0, 0.8));
        assert_eq!(
            r.driver().commands(),
            &[DrawCommand::Color([1.0, 1.0, 1.0, 0.4])]
        );
    }

    #[test]
    fn test_forwards_in_order() {
        let mut r = Immediate::new(RecordingBackend::new());
        r.bind_texture(3);
        r.begin(Primitive::Triangles).unwrap();
        r.vertex(1.0, 2.0, 0.0);
        r.end();
        assert_eq!(
            r.driver().commands(),
            &[
                DrawCommand::BindTexture(3),
                DrawCommand::Begin(Primitive::Triangles),
                DrawCommand::Vertex([1.0, 2.0, 0.0]),
                DrawCommand::End,
            ]
        );
    }

    #[test]
    fn test_no_context_is_fatal() {
        let mut driver = RecordingBackend::new();
        driver.set_context(false);
        let mut r = Immediate::new(driver);
        assert_eq!(r.begin(Primitive::Quads), Err(EngineError::NoRenderContext));
        assert!(r.driver().commands().is_empty());
    }
}
