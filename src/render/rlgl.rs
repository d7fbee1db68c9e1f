//! Driver over raylib's rlgl immediate-mode layer.
//!
//! rlgl already batches internally and has no display lists, so
//! [`RlglBackend::gen_lists`] always reports failure and bitmap fonts fall
//! back to drawing glyph by glyph. All calls must happen between raylib's
//! `begin_drawing` and `end_drawing` on the main thread.

use raylib::ffi;

use crate::error::{EngineError, EngineResult};

use super::{BlendMode, Color, ListMode, Primitive, RenderBackend, ScissorRect, VertexArrays};

// rlgl.h primitive modes
const RL_LINES: i32 = 0x0001;
const RL_TRIANGLES: i32 = 0x0004;
const RL_QUADS: i32 = 0x0007;

/// rlgl driver. Create one per frame inside the drawing scope, or keep one
/// and toggle [`RlglBackend::set_drawing`] around it.
pub struct RlglBackend {
    drawing: bool,
    scissoring: bool,
}

impl Default for RlglBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RlglBackend {
    pub fn new() -> Self {
        Self {
            drawing: false,
            scissoring: false,
        }
    }

    /// Mark whether raylib's drawing scope is open.
    pub fn set_drawing(&mut self, drawing: bool) {
        self.drawing = drawing;
    }

    fn mode(primitive: Primitive) -> Option<i32> {
        match primitive {
            Primitive::Lines => Some(RL_LINES),
            Primitive::Triangles => Some(RL_TRIANGLES),
            Primitive::Quads => Some(RL_QUADS),
            _ => None,
        }
    }

    fn to_u8(c: f32) -> u8 {
        (c.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl RenderBackend for RlglBackend {
    fn has_context(&self) -> bool {
        self.drawing
    }

    fn begin(&mut self, primitive: Primitive) -> EngineResult<()> {
        if !self.drawing {
            return Err(EngineError::NoRenderContext);
        }
        let mode = Self::mode(primitive).ok_or_else(|| {
            EngineError::Config(format!("rlgl cannot draw {:?}", primitive))
        })?;
        unsafe { ffi::rlBegin(mode) };
        Ok(())
    }

    fn end(&mut self) {
        unsafe { ffi::rlEnd() };
    }

    fn vertex(&mut self, x: f32, y: f32, z: f32) {
        unsafe { ffi::rlVertex3f(x, y, z) };
    }

    fn color(&mut self, color: Color) {
        unsafe {
            ffi::rlColor4ub(
                Self::to_u8(color.r),
                Self::to_u8(color.g),
                Self::to_u8(color.b),
                Self::to_u8(color.a),
            )
        };
    }

    fn tex_coord(&mut self, u: f32, v: f32) {
        unsafe { ffi::rlTexCoord2f(u, v) };
    }

    fn draw_arrays(&mut self, primitive: Primitive, arrays: VertexArrays<'_>) {
        let Some(mode) = Self::mode(primitive) else {
            log::warn!("rlgl cannot draw {:?}; {} vertices dropped", primitive, arrays.len());
            return;
        };
        unsafe {
            ffi::rlBegin(mode);
            for i in 0..arrays.len() {
                let [r, g, b, a] = arrays.colors[i];
                ffi::rlColor4ub(Self::to_u8(r), Self::to_u8(g), Self::to_u8(b), Self::to_u8(a));
                let [u, v] = arrays.tex_coords[i];
                ffi::rlTexCoord2f(u, v);
                let [x, y, z] = arrays.positions[i];
                ffi::rlVertex3f(x, y, z);
            }
            ffi::rlEnd();
        }
    }

    fn bind_texture(&mut self, texture: u32) {
        unsafe { ffi::rlSetTexture(texture) };
    }

    fn blend_mode(&mut self, mode: BlendMode) {
        let mode = match mode {
            BlendMode::Alpha => 0,
            BlendMode::Additive => 1,
            BlendMode::Multiplied => 2,
            BlendMode::AlphaPremultiply => 5,
        };
        unsafe { ffi::rlSetBlendMode(mode) };
    }

    fn push_matrix(&mut self) {
        unsafe { ffi::rlPushMatrix() };
    }

    fn pop_matrix(&mut self) {
        unsafe { ffi::rlPopMatrix() };
    }

    fn load_identity(&mut self) {
        unsafe { ffi::rlLoadIdentity() };
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        unsafe { ffi::rlTranslatef(x, y, z) };
    }

    fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        unsafe { ffi::rlRotatef(angle, x, y, z) };
    }

    fn scale(&mut self, x: f32, y: f32, z: f32) {
        unsafe { ffi::rlScalef(x, y, z) };
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { ffi::rlViewport(x, y, width, height) };
    }

    fn scissor(&mut self, rect: Option<ScissorRect>) {
        unsafe {
            ffi::rlDrawRenderBatchActive();
            match rect {
                Some(r) => {
                    ffi::rlEnableScissorTest();
                    ffi::rlScissor(r.x, r.y, r.width, r.height);
                    self.scissoring = true;
                }
                None if self.scissoring => {
                    ffi::rlDisableScissorTest();
                    self.scissoring = false;
                }
                None => {}
            }
        }
    }

    fn line_width(&mut self, width: f32) {
        unsafe { ffi::rlSetLineWidth(width) };
    }

    fn clear_color(&mut self, color: Color) {
        unsafe {
            ffi::rlClearColor(
                Self::to_u8(color.r),
                Self::to_u8(color.g),
                Self::to_u8(color.b),
                Self::to_u8(color.a),
            )
        };
    }

    fn clear(&mut self) {
        unsafe { ffi::rlClearScreenBuffers() };
    }

    fn gen_lists(&mut self, _count: u32) -> u32 {
        0
    }

    fn new_list(&mut self, handle: u32, _mode: ListMode) {
        log::warn!("rlgl has no display lists; new_list({}) ignored", handle);
    }

    fn end_list(&mut self) {}

    fn call_list(&mut self, _handle: u32) {}

    fn delete_lists(&mut self, _base: u32, _count: u32) {}
}
