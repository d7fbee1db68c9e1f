//! The draw-call surface shared by every renderer.
//!
//! [`RenderBackend`] mirrors the fixed-function immediate-mode API the engine
//! draws through: primitives are opened with [`RenderBackend::begin`], fed
//! vertices with the current color and texture coordinate, and closed with
//! [`RenderBackend::end`]. Drivers (the recording driver, rlgl) implement it
//! directly; [`Immediate`](super::immediate::Immediate) and
//! [`GeometryBatch`](super::batch::GeometryBatch) wrap a driver and implement
//! it again, so game code only ever sees `&mut dyn RenderBackend`.

use crate::error::EngineResult;

use super::{BlendMode, Color, ListMode, Primitive, ScissorRect, VertexArrays};

pub trait RenderBackend {
    /// Whether a render context is current. Drawing without one is a fatal
    /// configuration error.
    fn has_context(&self) -> bool;

    /// Open a primitive of the given type.
    fn begin(&mut self, primitive: Primitive) -> EngineResult<()>;
    /// Close the primitive opened by [`RenderBackend::begin`].
    fn end(&mut self);
    fn vertex(&mut self, x: f32, y: f32, z: f32);
    fn color(&mut self, color: Color);
    fn tex_coord(&mut self, u: f32, v: f32);

    /// Draw a whole vertex array in one call.
    fn draw_arrays(&mut self, primitive: Primitive, arrays: VertexArrays<'_>);

    /// Bind a texture by id; `0` unbinds.
    fn bind_texture(&mut self, texture: u32);
    fn blend_mode(&mut self, mode: BlendMode);

    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn load_identity(&mut self);
    fn translate(&mut self, x: f32, y: f32, z: f32);
    fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32);
    fn scale(&mut self, x: f32, y: f32, z: f32);

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// Enable scissoring to a rectangle, or disable it with `None`.
    fn scissor(&mut self, rect: Option<ScissorRect>);
    fn line_width(&mut self, width: f32);
    fn clear_color(&mut self, color: Color);
    fn clear(&mut self);

    /// Allocate `count` consecutive display list handles and return the
    /// first. Returns `0` when no lists could be allocated.
    fn gen_lists(&mut self, count: u32) -> u32;
    fn new_list(&mut self, handle: u32, mode: ListMode);
    fn end_list(&mut self);
    fn call_list(&mut self, handle: u32);
    fn delete_lists(&mut self, base: u32, count: u32);

    /// Multiply every submitted alpha by `scale`. Drivers ignore it; the
    /// renderers wrapping them apply it.
    fn set_global_alpha_scale(&mut self, _scale: f32) {}

    fn global_alpha_scale(&self) -> f32 {
        1.0
    }

    /// Push any geometry still held back by the renderer.
    fn flush(&mut self) {}
}

impl<B: RenderBackend + ?Sized> RenderBackend for Box<B> {
    fn has_context(&self) -> bool {
        (**self).has_context()
    }
    fn begin(&mut self, primitive: Primitive) -> EngineResult<()> {
        (**self).begin(primitive)
    }
    fn end(&mut self) {
        (**self).end()
    }
    fn vertex(&mut self, x: f32, y: f32, z: f32) {
        (**self).vertex(x, y, z)
    }
    fn color(&mut self, color: Color) {
        (**self).color(color)
    }
    fn tex_coord(&mut self, u: f32, v: f32) {
        (**self).tex_coord(u, v)
    }
    fn draw_arrays(&mut self, primitive: Primitive, arrays: VertexArrays<'_>) {
        (**self).draw_arrays(primitive, arrays)
    }
    fn bind_texture(&mut self, texture: u32) {
        (**self).bind_texture(texture)
    }
    fn blend_mode(&mut self, mode: BlendMode) {
        (**self).blend_mode(mode)
    }
    fn push_matrix(&mut self) {
        (**self).push_matrix()
    }
    fn pop_matrix(&mut self) {
        (**self).pop_matrix()
    }
    fn load_identity(&mut self) {
        (**self).load_identity()
    }
    fn translate(&mut self, x: f32, y: f32, z: f32) {
        (**self).translate(x, y, z)
    }
    fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        (**self).rotate(angle, x, y, z)
    }
    fn scale(&mut self, x: f32, y: f32, z: f32) {
        (**self).scale(x, y, z)
    }
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        (**self).viewport(x, y, width, height)
    }
    fn scissor(&mut self, rect: Option<ScissorRect>) {
        (**self).scissor(rect)
    }
    fn line_width(&mut self, width: f32) {
        (**self).line_width(width)
    }
    fn clear_color(&mut self, color: Color) {
        (**self).clear_color(color)
    }
    fn clear(&mut self) {
        (**self).clear()
    }
    fn gen_lists(&mut self, count: u32) -> u32 {
        (**self).gen_lists(count)
    }
    fn new_list(&mut self, handle: u32, mode: ListMode) {
        (**self).new_list(handle, mode)
    }
    fn end_list(&mut self) {
        (**self).end_list()
    }
    fn call_list(&mut self, handle: u32) {
        (**self).call_list(handle)
    }
    fn delete_lists(&mut self, base: u32, count: u32) {
        (**self).delete_lists(base, count)
    }
    fn set_global_alpha_scale(&mut self, scale: f32) {
        (**self).set_global_alpha_scale(scale)
    }
    fn global_alpha_scale(&self) -> f32 {
        (**self).global_alpha_scale()
    }
    fn flush(&mut self) {
        (**self).flush()
    }
}
