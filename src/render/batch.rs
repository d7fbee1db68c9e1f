//! Vertex-array batching renderer.
//!
//! [`GeometryBatch`] sits on top of a driver and turns the immediate-mode
//! stream (`begin`, `color`, `tex_coord`, `vertex`, `end`) into as few
//! `draw_arrays` calls as possible.
//!
//! # Batching rules
//!
//! - Vertices are buffered in three parallel arrays (position, color, texture
//!   coordinate) for as long as the primitive type stays the same; `end` does
//!   not flush.
//! - `begin` with a different primitive type flushes first.
//! - When the buffer comes within `safety_margin` of `max_vertices`, it is
//!   flushed as soon as the vertex count lands on a primitive boundary
//!   (4 for quads, 3 for triangles, 2 for lines), then accumulation resumes
//!   with the same type.
//! - Any state change the buffered geometry depends on (texture, blending,
//!   matrices, scissor, line width, clear, viewport, list calls) flushes
//!   before it is applied.
//! - Batches smaller than `flush_tolerance` are replayed through the driver's
//!   begin/vertex/end path; setting up arrays costs more than it saves there.
//! - While a display list is compiling everything passes straight through,
//!   since vertex arrays drawn from client memory cannot be captured in a
//!   list.
//!
//! Strips, fans and loops have no safe split point. One that outgrows
//! `max_vertices` keeps growing the buffers and logs a warning once.

use crate::error::{EngineError, EngineResult};

use super::{BlendMode, Color, ListMode, Primitive, RenderBackend, ScissorRect, VertexArrays};

const DEFAULT_MAX_VERTICES: usize = 5000;
const DEFAULT_SAFETY_MARGIN: usize = 50;
const DEFAULT_FLUSH_TOLERANCE: usize = 20;

/// Tunable limits of a [`GeometryBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Vertices the buffers are sized for.
    pub max_vertices: usize,
    /// How close to `max_vertices` a split may happen.
    pub safety_margin: usize,
    /// Batches with fewer vertices than this are replayed directly.
    pub flush_tolerance: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            flush_tolerance: DEFAULT_FLUSH_TOLERANCE,
        }
    }
}

impl BatchConfig {
    /// Vertex count from which a batch is split at the next safe boundary.
    pub fn split_threshold(&self) -> usize {
        self.max_vertices.saturating_sub(self.safety_margin)
    }
}

/// Counters describing how pending geometry left the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// `draw_arrays` calls issued.
    pub batched_draws: usize,
    /// Small batches replayed with begin/vertex/end.
    pub direct_replays: usize,
    /// Flushes forced by the buffer filling up.
    pub splits: usize,
    /// Batches that outgrew `max_vertices` with no safe split point.
    pub overflows: usize,
}

pub struct GeometryBatch<B> {
    driver: B,
    config: BatchConfig,
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 4]>,
    tex_coords: Vec<[f32; 2]>,
    current: Option<Primitive>,
    color: [f32; 4],
    tex_coord: [f32; 2],
    list_depth: u32,
    alpha_scale: f32,
    stats: BatchStats,
    overflowing: bool,
}

impl<B: RenderBackend> GeometryBatch<B> {
    pub fn new(driver: B, config: BatchConfig) -> Self {
        Self {
            driver,
            config,
            positions: Vec::with_capacity(config.max_vertices),
            colors: Vec::with_capacity(config.max_vertices),
            tex_coords: Vec::with_capacity(config.max_vertices),
            current: None,
            color: Color::WHITE.to_array(),
            tex_coord: [0.0, 0.0],
            list_depth: 0,
            alpha_scale: 1.0,
            stats: BatchStats::default(),
            overflowing: false,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Vertices buffered and not yet drawn.
    pub fn pending(&self) -> usize {
        self.positions.len()
    }

    /// Primitive type being accumulated, if any.
    pub fn current_primitive(&self) -> Option<Primitive> {
        self.current
    }

    /// Whether a display list is being compiled.
    pub fn is_recording_list(&self) -> bool {
        self.list_depth > 0
    }

    pub fn driver(&self) -> &B {
        &self.driver
    }

    /// Access the driver directly. Pending geometry is flushed first so the
    /// caller sees the stream in order.
    pub fn driver_mut(&mut self) -> &mut B {
        self.submit();
        &mut self.driver
    }

    pub fn into_driver(mut self) -> B {
        RenderBackend::flush(&mut self);
        self.driver
    }

    /// Draw whatever is buffered, keeping the current primitive type.
    fn submit(&mut self) {
        let count = self.positions.len();
        if count == 0 {
            return;
        }
        let Some(primitive) = self.current else {
            // Vertices are never buffered without a primitive type.
            self.clear_buffers();
            return;
        };

        if count < self.config.flush_tolerance {
            if let Err(e) = self.driver.begin(primitive) {
                log::error!("Dropping {} buffered vertices: {}", count, e);
                self.clear_buffers();
                return;
            }
            for i in 0..count {
                self.driver.color(Color::from_array(self.colors[i]));
                let [u, v] = self.tex_coords[i];
                self.driver.tex_coord(u, v);
                let [x, y, z] = self.positions[i];
                self.driver.vertex(x, y, z);
            }
            self.driver.end();
            self.stats.direct_replays += 1;
        } else {
            self.driver.draw_arrays(
                primitive,
                VertexArrays {
                    positions: &self.positions,
                    colors: &self.colors,
                    tex_coords: &self.tex_coords,
                },
            );
            self.stats.batched_draws += 1;
        }
        log::trace!("Flushed {} {:?} vertices", count, primitive);
        self.clear_buffers();
    }

    fn clear_buffers(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.tex_coords.clear();
        self.overflowing = false;
    }

    fn check_split(&mut self, primitive: Primitive) {
        let count = self.positions.len();
        if count < self.config.split_threshold() {
            return;
        }
        if primitive.is_splittable(count) {
            self.submit();
            self.stats.splits += 1;
        } else if count >= self.config.max_vertices && !self.overflowing {
            self.overflowing = true;
            self.stats.overflows += 1;
            log::warn!(
                "{:?} batch reached {} vertices with no safe split point; growing buffers",
                primitive,
                count
            );
        }
    }
}

impl<B: RenderBackend> RenderBackend for GeometryBatch<B> {
    fn has_context(&self) -> bool {
        self.driver.has_context()
    }

    fn begin(&mut self, primitive: Primitive) -> EngineResult<()> {
        if !self.driver.has_context() {
            log::error!("begin({:?}) called with no render context", primitive);
            return Err(EngineError::NoRenderContext);
        }
        if self.list_depth > 0 {
            return self.driver.begin(primitive);
        }
        if self.current != Some(primitive) {
            self.submit();
            self.current = Some(primitive);
        }
        Ok(())
    }

    fn end(&mut self) {
        if self.list_depth > 0 {
            self.driver.end();
        }
    }

    fn vertex(&mut self, x: f32, y: f32, z: f32) {
        if self.list_depth > 0 {
            self.driver.vertex(x, y, z);
            return;
        }
        let Some(primitive) = self.current else {
            log::debug!("vertex({}, {}, {}) outside begin/end ignored", x, y, z);
            return;
        };
        self.positions.push([x, y, z]);
        self.colors.push(self.color);
        self.tex_coords.push(self.tex_coord);
        self.check_split(primitive);
    }

    fn color(&mut self, color: Color) {
        let color = color.scale_alpha(self.alpha_scale);
        // tracked in both modes: a color set inside a list stays current after it
        self.color = color.to_array();
        if self.list_depth > 0 {
            self.driver.color(color);
        }
    }

    fn tex_coord(&mut self, u: f32, v: f32) {
        if self.list_depth > 0 {
            self.driver.tex_coord(u, v);
        } else {
            self.tex_coord = [u, v];
        }
    }

    fn draw_arrays(&mut self, primitive: Primitive, arrays: VertexArrays<'_>) {
        self.submit();
        self.driver.draw_arrays(primitive, arrays);
    }

    fn bind_texture(&mut self, texture: u32) {
        self.submit();
        self.driver.bind_texture(texture);
    }

    fn blend_mode(&mut self, mode: BlendMode) {
        self.submit();
        self.driver.blend_mode(mode);
    }

    fn push_matrix(&mut self) {
        self.submit();
        self.driver.push_matrix();
    }

    fn pop_matrix(&mut self) {
        self.submit();
        self.driver.pop_matrix();
    }

    fn load_identity(&mut self) {
        self.submit();
        self.driver.load_identity();
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.submit();
        self.driver.translate(x, y, z);
    }

    fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        self.submit();
        self.driver.rotate(angle, x, y, z);
    }

    fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.submit();
        self.driver.scale(x, y, z);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.submit();
        self.driver.viewport(x, y, width, height);
    }

    fn scissor(&mut self, rect: Option<ScissorRect>) {
        self.submit();
        self.driver.scissor(rect);
    }

    fn line_width(&mut self, width: f32) {
        self.submit();
        self.driver.line_width(width);
    }

    fn clear_color(&mut self, color: Color) {
        self.driver.clear_color(color);
    }

    fn clear(&mut self) {
        self.submit();
        self.driver.clear();
    }

    fn gen_lists(&mut self, count: u32) -> u32 {
        self.driver.gen_lists(count)
    }

    fn new_list(&mut self, handle: u32, mode: ListMode) {
        self.submit();
        // The list inherits the driver color; it must not capture it.
        self.driver.color(Color::from_array(self.color));
        self.current = None;
        self.list_depth += 1;
        self.driver.new_list(handle, mode);
    }

    fn end_list(&mut self) {
        self.driver.end_list();
        self.list_depth = self.list_depth.saturating_sub(1);
    }

    fn call_list(&mut self, handle: u32) {
        self.submit();
        self.driver.color(Color::from_array(self.color));
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

    fn flush(&mut self) {
        self.submit();
        self.current = None;
    }
}
