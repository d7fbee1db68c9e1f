//! Headless recording driver.
//!
//! [`RecordingBackend`] stands in for the GPU when no window exists: each
//! call is appended to a command log that can be inspected afterwards.
//! Display lists are real: compiling stores the commands under the handle and
//! [`DrawCommand::CallList`] entries can be expanded back into what the list
//! drew. The engine's tests and the headless demo run on this driver.

use rustc_hash::FxHashMap;

use crate::error::{EngineError, EngineResult};

use super::{BlendMode, Color, ListMode, Primitive, RenderBackend, ScissorRect, VertexArrays};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Begin(Primitive),
    End,
    Vertex([f32; 3]),
    Color([f32; 4]),
    TexCoord([f32; 2]),
    DrawArrays {
        primitive: Primitive,
        positions: Vec<[f32; 3]>,
        colors: Vec<[f32; 4]>,
        tex_coords: Vec<[f32; 2]>,
    },
    BindTexture(u32),
    BlendMode(BlendMode),
    PushMatrix,
    PopMatrix,
    LoadIdentity,
    Translate([f32; 3]),
    Rotate(f32, [f32; 3]),
    Scale([f32; 3]),
    Viewport([i32; 4]),
    Scissor(Option<ScissorRect>),
    LineWidth(f32),
    ClearColor([f32; 4]),
    Clear,
    CallList(u32),
}

impl DrawCommand {
    /// Whether this command puts geometry on screen.
    pub fn is_draw_call(&self) -> bool {
        matches!(self, DrawCommand::Begin(_) | DrawCommand::DrawArrays { .. })
    }
}

struct Compiling {
    handle: u32,
    mode: ListMode,
    commands: Vec<DrawCommand>,
}

/// Driver that records instead of drawing.
pub struct RecordingBackend {
    commands: Vec<DrawCommand>,
    lists: FxHashMap<u32, Vec<DrawCommand>>,
    compiling: Option<Compiling>,
    next_list: u32,
    list_limit: Option<u32>,
    context: bool,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            lists: FxHashMap::default(),
            compiling: None,
            next_list: 1,
            list_limit: None,
            context: true,
        }
    }

    /// Cap the number of display list handles this driver will hand out.
    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = Some(limit);
        self
    }

    /// Simulate a lost (or never created) render context.
    pub fn set_context(&mut self, current: bool) {
        self.context = current;
    }

    /// Commands executed so far, with list calls left unexpanded.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the executed command log.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Commands compiled into a display list.
    pub fn list(&self, handle: u32) -> Option<&[DrawCommand]> {
        self.lists.get(&handle).map(Vec::as_slice)
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Executed commands with every `CallList` replaced by the list contents.
    pub fn expanded(&self) -> Vec<DrawCommand> {
        let mut out = Vec::with_capacity(self.commands.len());
        for cmd in &self.commands {
            self.expand_into(cmd, &mut out, 0);
        }
        out
    }

    fn expand_into(&self, cmd: &DrawCommand, out: &mut Vec<DrawCommand>, depth: usize) {
        match cmd {
            // GL caps nesting at 64; a deeper chain is a self-referencing list.
            DrawCommand::CallList(handle) if depth < 64 => {
                if let Some(list) = self.lists.get(handle) {
                    for inner in list {
                        self.expand_into(inner, out, depth + 1);
                    }
                }
            }
            other => out.push(other.clone()),
        }
    }

    /// Number of draw calls issued, counting each `begin` and each
    /// `draw_arrays` once.
    pub fn draw_calls(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw_call()).count()
    }

    /// Number of `draw_arrays` calls issued.
    pub fn batched_draws(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawArrays { .. }))
            .count()
    }

    /// Vertices that reached the screen, list calls included.
    pub fn vertices_drawn(&self) -> usize {
        self.expanded()
            .iter()
            .map(|c| match c {
                DrawCommand::Vertex(_) => 1,
                DrawCommand::DrawArrays { positions, .. } => positions.len(),
                _ => 0,
            })
            .sum()
    }

    fn record(&mut self, cmd: DrawCommand) {
        match &mut self.compiling {
            Some(compiling) => {
                if compiling.mode == ListMode::CompileAndExecute {
                    self.commands.push(cmd.clone());
                }
                compiling.commands.push(cmd);
            }
            None => self.commands.push(cmd),
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn has_context(&self) -> bool {
        self.context
    }

    fn begin(&mut self, primitive: Primitive) -> EngineResult<()> {
        if !self.context {
            return Err(EngineError::NoRenderContext);
        }
        self.record(DrawCommand::Begin(primitive));
        Ok(())
    }

    fn end(&mut self) {
        self.record(DrawCommand::End);
    }

    fn vertex(&mut self, x: f32, y: f32, z: f32) {
        self.record(DrawCommand::Vertex([x, y, z]));
    }

    fn color(&mut self, color: Color) {
        self.record(DrawCommand::Color(color.to_array()));
    }

    fn tex_coord(&mut self, u: f32, v: f32) {
        self.record(DrawCommand::TexCoord([u, v]));
    }

    fn draw_arrays(&mut self, primitive: Primitive, arrays: VertexArrays<'_>) {
        self.record(DrawCommand::DrawArrays {
            primitive,
            positions: arrays.positions.to_vec(),
            colors: arrays.colors.to_vec(),
            tex_coords: arrays.tex_coords.to_vec(),
        });
    }

    fn bind_texture(&mut self, texture: u32) {
        self.record(DrawCommand::BindTexture(texture));
    }

    fn blend_mode(&mut self, mode: BlendMode) {
        self.record(DrawCommand::BlendMode(mode));
    }

    fn push_matrix(&mut self) {
        self.record(DrawCommand::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        self.record(DrawCommand::PopMatrix);
    }

    fn load_identity(&mut self) {
        self.record(DrawCommand::LoadIdentity);
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.record(DrawCommand::Translate([x, y, z]));
    }

    fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        self.record(DrawCommand::Rotate(angle, [x, y, z]));
    }

    fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.record(DrawCommand::Scale([x, y, z]));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(DrawCommand::Viewport([x, y, width, height]));
    }

    fn scissor(&mut self, rect: Option<ScissorRect>) {
        self.record(DrawCommand::Scissor(rect));
    }

    fn line_width(&mut self, width: f32) {
        self.record(DrawCommand::LineWidth(width));
    }

    fn clear_color(&mut self, color: Color) {
        self.record(DrawCommand::ClearColor(color.to_array()));
    }

    fn clear(&mut self) {
        self.record(DrawCommand::Clear);
    }

    fn gen_lists(&mut self, count: u32) -> u32 {
        if count == 0 {
            return 0;
        }
        let used = self.next_list - 1;
        if let Some(limit) = self.list_limit {
            if used.saturating_add(count) > limit {
                log::debug!(
                    "Refusing {} display lists ({} of {} in use)",
                    count,
                    used,
                    limit
                );
                return 0;
            }
        }
        let base = self.next_list;
        self.next_list += count;
        base
    }

    fn new_list(&mut self, handle: u32, mode: ListMode) {
        if let Some(current) = &self.compiling {
            log::warn!(
                "new_list({}) while list {} is compiling; ignored",
                handle,
                current.handle
            );
            return;
        }
        self.compiling = Some(Compiling {
            handle,
            mode,
            commands: Vec::new(),
        });
    }

    fn end_list(&mut self) {
        if let Some(compiling) = self.compiling.take() {
            self.lists.insert(compiling.handle, compiling.commands);
        }
    }

    fn call_list(&mut self, handle: u32) {
        self.record(DrawCommand::CallList(handle));
    }

    fn delete_lists(&mut self, base: u32, count: u32) {
        for handle in base..base.saturating_add(count) {
            self.lists.remove(&handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_and_execute_records_both() {
        let mut rec = RecordingBackend::new();
        let base = rec.gen_lists(2);
        assert_eq!(base, 1);

        rec.new_list(base, ListMode::CompileAndExecute);
        rec.begin(Primitive::Lines).unwrap();
        rec.vertex(0.0, 0.0, 0.0);
        rec.vertex(1.0, 1.0, 0.0);
        rec.end();
        rec.end_list();

        assert_eq!(rec.list(base).map(|l| l.len()), Some(4));
        assert_eq!(rec.commands().len(), 4);
    }

    #[test]
    fn test_compile_only_draws_nothing() {
        let mut rec = RecordingBackend::new();
        let base = rec.gen_lists(1);
        rec.new_list(base, ListMode::Compile);
        rec.clear();
        rec.end_list();
        assert!(rec.commands().is_empty());

        rec.call_list(base);
        assert_eq!(rec.expanded(), vec![DrawCommand::Clear]);
    }

    #[test]
    fn test_list_limit() {
        let mut rec = RecordingBackend::new().with_list_limit(10);
        assert_eq!(rec.gen_lists(8), 1);
        assert_eq!(rec.gen_lists(3), 0);
        assert_eq!(rec.gen_lists(2), 9);
    }

    #[test]
    fn test_begin_without_context_fails() {
        let mut rec = RecordingBackend::new();
        rec.set_context(false);
        assert_eq!(rec.begin(Primitive::Quads), Err(EngineError::NoRenderContext));
    }

    #[test]
    fn test_vertices_drawn_counts_lists() {
        let mut rec = RecordingBackend::new();
        let base = rec.gen_lists(1);
        rec.new_list(base, ListMode::Compile);
        rec.vertex(0.0, 0.0, 0.0);
        rec.vertex(0.0, 0.0, 0.0);
        rec.end_list();
        rec.call_list(base);
        rec.call_list(base);
        assert_eq!(rec.vertices_drawn(), 4);
    }
}
