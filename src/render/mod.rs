//! Rendering core.
//!
//! - [`backend`] – the [`RenderBackend`] trait every renderer implements
//! - [`immediate`] – direct-mode renderer wrapping a driver
//! - [`batch`] – vertex-array batching renderer wrapping a driver
//! - [`recording`] – headless driver recording commands, with display lists
//! - `rlgl` – driver over raylib's rlgl layer (feature `raylib`)
//!
//! Pick a renderer once at startup with [`create_renderer`]; everything else
//! draws through `&mut dyn RenderBackend`.

pub mod backend;
pub mod batch;
pub mod immediate;
pub mod recording;
#[cfg(feature = "raylib")]
pub mod rlgl;

use serde::{Deserialize, Serialize};

pub use backend::RenderBackend;
pub use batch::{BatchConfig, BatchStats, GeometryBatch};
pub use immediate::Immediate;
pub use recording::{DrawCommand, RecordingBackend};

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Color with its alpha multiplied by `scale`.
    pub fn scale_alpha(self, scale: f32) -> Self {
        Self {
            a: self.a * scale,
            ..self
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Primitive types understood by [`RenderBackend::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

impl Primitive {
    /// Number of vertices forming one independent primitive, for the types
    /// whose vertex stream can be cut between groups. Strips, fans, loops and
    /// points return `None`: a batch of them is never split.
    pub fn group_size(self) -> Option<usize> {
        match self {
            Primitive::Quads => Some(4),
            Primitive::Triangles => Some(3),
            Primitive::Lines => Some(2),
            _ => None,
        }
    }

    /// Whether `count` vertices end exactly on a primitive boundary.
    pub fn is_splittable(self, count: usize) -> bool {
        self.group_size().is_some_and(|n| count % n == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Multiplied,
    AlphaPremultiply,
}

/// How a display list is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Record only.
    Compile,
    /// Record and draw at the same time.
    CompileAndExecute,
}

/// Scissor rectangle in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Parallel vertex arrays handed to [`RenderBackend::draw_arrays`].
#[derive(Debug, Clone, Copy)]
pub struct VertexArrays<'a> {
    pub positions: &'a [[f32; 3]],
    pub colors: &'a [[f32; 4]],
    pub tex_coords: &'a [[f32; 2]],
}

impl VertexArrays<'_> {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Which renderer [`create_renderer`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Immediate,
    #[default]
    VertexArray,
}

impl std::str::FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(RendererKind::Immediate),
            "vertex_array" | "vertex-array" | "vao" => Ok(RendererKind::VertexArray),
            other => Err(format!("unknown renderer kind '{}'", other)),
        }
    }
}

/// Build the renderer selected at startup around a driver.
pub fn create_renderer<B>(kind: RendererKind, driver: B, config: BatchConfig) -> Box<dyn RenderBackend>
where
    B: RenderBackend + 'static,
{
    log::info!("Using {:?} renderer", kind);
    match kind {
        RendererKind::Immediate => Box::new(Immediate::new(driver)),
        RendererKind::VertexArray => Box::new(GeometryBatch::new(driver, config)),
    }
}
