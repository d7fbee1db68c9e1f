//! Bitmap fonts.
//!
//! A [`BitmapFont`] draws text from a single glyph page ([`GlyphAtlas`]).
//! Whole strings are compiled into display lists on first draw and replayed
//! by handle afterwards ([`DisplayListCache`]); partial ranges and fonts
//! whose renderer has no display lists are drawn glyph by glyph every time.
//! Either way the measurement API gives the same answers.
//!
//! Layout rules:
//! - the pen starts at `(0, 0)`; each glyph is placed at its offsets and
//!   advances the pen by `xadvance` plus the kerning against the previous
//!   glyph;
//! - `'\n'` returns the pen to `x = 0` and moves it down by the line height;
//! - codes the font does not define are skipped without advancing.

pub mod cache;
pub mod glyph;

pub use cache::{CacheStats, DEFAULT_CACHE_SIZE, DisplayList, DisplayListCache};
pub use glyph::{Glyph, GlyphAtlas, GlyphDef, MAX_CHAR};

use crate::error::EngineResult;
use crate::image::Image;
use crate::render::{Color, Primitive, RenderBackend};

pub struct BitmapFont {
    atlas: GlyphAtlas,
    line_height: i32,
    cache: Option<DisplayListCache>,
}

impl BitmapFont {
    /// Font drawn without display lists.
    pub fn new(atlas: GlyphAtlas, line_height: i32) -> Self {
        Self {
            atlas,
            line_height,
            cache: None,
        }
    }

    /// Font caching up to `cache_size` strings in display lists. Falls back
    /// to uncached drawing when the renderer cannot allocate them.
    pub fn with_display_lists(
        atlas: GlyphAtlas,
        line_height: i32,
        renderer: &mut dyn RenderBackend,
        cache_size: usize,
    ) -> Self {
        Self {
            atlas,
            line_height,
            cache: DisplayListCache::new(renderer, cache_size),
        }
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache(&self) -> Option<&DisplayListCache> {
        self.cache.as_ref()
    }

    /// Stop caching and free the display list pool.
    pub fn disable_caching(&mut self, renderer: &mut dyn RenderBackend) {
        if let Some(cache) = self.cache.take() {
            cache.release(renderer);
        }
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn page(&self) -> &Image {
        self.atlas.page()
    }

    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    pub fn kerning(&self, first: char, second: char) -> i32 {
        self.atlas.kerning(first as u32, second as u32)
    }

    pub fn draw_string(
        &mut self,
        renderer: &mut dyn RenderBackend,
        x: f32,
        y: f32,
        text: &str,
        color: Color,
    ) -> EngineResult<()> {
        let count = text.chars().count();
        if count == 0 {
            return Ok(());
        }
        self.draw_string_range(renderer, x, y, text, color, 0, count - 1)
    }

    /// Draw the characters `start..=end` of `text`, laid out as if the whole
    /// string were drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_range(
        &mut self,
        renderer: &mut dyn RenderBackend,
        x: f32,
        y: f32,
        text: &str,
        color: Color,
        start: usize,
        end: usize,
    ) -> EngineResult<()> {
        let count = text.chars().count();
        if count == 0 || start > end {
            return Ok(());
        }

        self.atlas.page().bind(renderer);
        renderer.color(color);
        renderer.translate(x, y, 0.0);

        let whole = start == 0 && end >= count - 1;
        let atlas = &self.atlas;
        let line_height = self.line_height;
        let result = match self.cache.as_mut() {
            Some(cache) if whole => cache
                .draw(renderer, text, |r| {
                    render_glyphs(atlas, line_height, r, text, 0, count - 1)
                })
                .map(|_| ()),
            _ => render_glyphs(atlas, line_height, renderer, text, start, end),
        };

        renderer.translate(-x, -y, 0.0);
        result
    }

    /// Visual width of the widest line: advances up to the last glyph of the
    /// line, plus that glyph's own width.
    pub fn width(&mut self, text: &str) -> i32 {
        let atlas = &self.atlas;
        match self.cache.as_mut().and_then(|c| c.get(text)) {
            Some(list) => list.width_or_insert_with(|| measure_width(atlas, text)),
            None => measure_width(atlas, text),
        }
    }

    /// Width of the widest line measured by advances only, i.e. where the
    /// pen ends up.
    pub fn logical_width(&mut self, text: &str) -> i32 {
        let atlas = &self.atlas;
        match self.cache.as_mut().and_then(|c| c.get(text)) {
            Some(list) => list.logical_width_or_insert_with(|| measure_logical_width(atlas, text)),
            None => measure_logical_width(atlas, text),
        }
    }

    /// Height of the text: the tallest glyph (offset included) of the last
    /// line plus one line height per line break.
    pub fn height(&mut self, text: &str) -> i32 {
        let atlas = &self.atlas;
        let line_height = self.line_height;
        match self.cache.as_mut().and_then(|c| c.get(text)) {
            Some(list) => list.height_or_insert_with(|| measure_height(atlas, line_height, text)),
            None => measure_height(atlas, line_height, text),
        }
    }

    /// Smallest vertical glyph offset on the first line.
    pub fn y_offset(&mut self, text: &str) -> i32 {
        let atlas = &self.atlas;
        match self.cache.as_mut().and_then(|c| c.get(text)) {
            Some(list) => list.y_offset_or_insert_with(|| measure_y_offset(atlas, text)),
            None => measure_y_offset(atlas, text),
        }
    }

    /// Free the display list pool, if any.
    pub fn release(mut self, renderer: &mut dyn RenderBackend) {
        self.disable_caching(renderer);
    }
}

fn render_glyphs(
    atlas: &GlyphAtlas,
    line_height: i32,
    renderer: &mut dyn RenderBackend,
    text: &str,
    start: usize,
    end: usize,
) -> EngineResult<()> {
    renderer.begin(Primitive::Quads)?;
    let mut x = 0;
    let mut y = 0;
    let mut last: Option<&Glyph> = None;
    for (i, c) in text.chars().enumerate() {
        if c == '\n' {
            x = 0;
            y += line_height;
            last = None;
            continue;
        }
        let code = c as u32;
        let Some(glyph) = atlas.glyph(code) else {
            continue;
        };
        if let Some(prev) = last {
            x += prev.kerning(code);
        }
        last = Some(glyph);
        if i >= start && i <= end {
            glyph.draw_embedded(renderer, atlas.page(), x, y);
        }
        x += glyph.xadvance;
    }
    renderer.end();
    Ok(())
}

fn measure_width(atlas: &GlyphAtlas, text: &str) -> i32 {
    let mut max_width = 0;
    for line in text.split('\n') {
        let mut width = 0;
        let mut last: Option<&Glyph> = None;
        let glyphs: Vec<(u32, &Glyph)> = line
            .chars()
            .filter_map(|c| atlas.glyph(c as u32).map(|g| (c as u32, g)))
            .collect();
        for (i, &(code, glyph)) in glyphs.iter().enumerate() {
            if let Some(prev) = last {
                width += prev.kerning(code);
            }
            last = Some(glyph);
            if i + 1 < glyphs.len() {
                width += glyph.xadvance;
            } else {
                width += glyph.xoffset + glyph.width as i32;
            }
            max_width = max_width.max(width);
        }
    }
    max_width
}

fn measure_logical_width(atlas: &GlyphAtlas, text: &str) -> i32 {
    let mut max_width = 0;
    for line in text.split('\n') {
        let mut width = 0;
        let mut last: Option<&Glyph> = None;
        for c in line.chars() {
            let code = c as u32;
            let Some(glyph) = atlas.glyph(code) else {
                continue;
            };
            if let Some(prev) = last {
                width += prev.kerning(code);
            }
            last = Some(glyph);
            width += glyph.xadvance;
        }
        max_width = max_width.max(width);
    }
    max_width
}

fn measure_height(atlas: &GlyphAtlas, line_height: i32, text: &str) -> i32 {
    let mut lines = 0;
    let mut max_height = 0;
    for c in text.chars() {
        if c == '\n' {
            lines += 1;
            max_height = 0;
            continue;
        }
        if c == ' ' {
            continue;
        }
        if let Some(glyph) = atlas.glyph(c as u32) {
            max_height = max_height.max(glyph.height as i32 + glyph.yoffset);
        }
    }
    max_height + lines * line_height
}

fn measure_y_offset(atlas: &GlyphAtlas, text: &str) -> i32 {
    text.split('\n')
        .next()
        .unwrap_or("")
        .chars()
        .filter_map(|c| atlas.glyph(c as u32))
        .map(|g| g.yoffset)
        .min()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Texture;
    use crate::render::{BatchConfig, DrawCommand, GeometryBatch, RecordingBackend};

    fn glyph(id: char, width: u32, height: u32, yoffset: i32, xadvance: i32) -> GlyphDef {
        GlyphDef {
            id: id as u32,
            x: 0,
            y: 0,
            width,
            height,
            xoffset: 0,
            yoffset,
            xadvance,
            kerning: Vec::new(),
        }
    }

    fn atlas() -> GlyphAtlas {
        let mut a = glyph('A', 8, 10, 2, 9);
        a.kerning = vec![('B' as u32, -2)];
        GlyphAtlas::new(
            Image::new(Texture::exact(5, 128, 128)),
            &[a, glyph('B', 7, 12, 0, 8), glyph('.', 2, 2, 10, 3), glyph(' ', 0, 0, 0, 4)],
        )
    }

    #[test]
    fn test_width_uses_last_glyph_extent() {
        let mut font = BitmapFont::new(atlas(), 16);
        // A(9) + kerning(-2) + B width 7
        assert_eq!(font.width("AB"), 14);
        assert_eq!(font.logical_width("AB"), 15);
    }

    #[test]
    fn test_width_of_multiline_takes_widest() {
        let mut font = BitmapFont::new(atlas(), 16);
        assert_eq!(font.width("A\nAB"), 14);
    }

    #[test]
    fn test_height_counts_lines() {
        let mut font = BitmapFont::new(atlas(), 16);
        assert_eq!(font.height("AB"), 12);
        assert_eq!(font.height("AB\n."), 16 + 12);
    }

    #[test]
    fn test_y_offset_first_line_only() {
        let mut font = BitmapFont::new(atlas(), 16);
        assert_eq!(font.y_offset("A."), 2);
        assert_eq!(font.y_offset("AB\n."), 0);
        assert_eq!(font.y_offset(""), 0);
    }

    #[test]
    fn test_unknown_codes_skipped() {
        let mut font = BitmapFont::new(atlas(), 16);
        assert_eq!(font.logical_width("AZé"), 9);
    }

    #[test]
    fn test_whole_string_is_cached() {
        let mut r = GeometryBatch::new(RecordingBackend::new(), BatchConfig::default());
        let mut font = BitmapFont::with_display_lists(atlas(), 16, &mut r, 4);
        assert!(font.is_caching());

        font.draw_string(&mut r, 10.0, 20.0, "AB", Color::WHITE).unwrap();
        font.draw_string(&mut r, 10.0, 20.0, "AB", Color::WHITE).unwrap();
        r.flush();

        let cache = font.cache().unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().hits, 1);
        let handle = cache.peek("AB").unwrap().handle();
        let calls = r
            .driver()
            .commands()
            .iter()
            .filter(|c| **c == DrawCommand::CallList(handle))
            .count();
        assert_eq!(calls, 1);
        // compiled once, replayed once: 2 glyphs x 4 vertices each time
        assert_eq!(r.driver().vertices_drawn(), 16);
    }

    #[test]
    fn test_range_draw_bypasses_cache() {
        let mut r = GeometryBatch::new(RecordingBackend::new(), BatchConfig::default());
        let mut font = BitmapFont::with_display_lists(atlas(), 16, &mut r, 4);
        font.draw_string_range(&mut r, 0.0, 0.0, "AB.", Color::WHITE, 1, 2).unwrap();
        r.flush();
        assert!(font.cache().unwrap().is_empty());
        assert_eq!(r.driver().vertices_drawn(), 8);
    }

    #[test]
    fn test_range_keeps_layout_of_whole_string() {
        let mut r = RecordingBackend::new();
        let mut font = BitmapFont::new(atlas(), 16);
        font.draw_string_range(&mut r, 0.0, 0.0, "AB", Color::WHITE, 1, 1).unwrap();
        let first_vertex = r.commands().iter().find_map(|c| match c {
            DrawCommand::Vertex(v) => Some(*v),
            _ => None,
        });
        // B sits after A's advance and the A-B kerning
        assert_eq!(first_vertex, Some([7.0, 0.0, 0.0]));
    }

    #[test]
    fn test_fallback_without_display_lists() {
        let mut r = GeometryBatch::new(
            RecordingBackend::new().with_list_limit(2),
            BatchConfig::default(),
        );
        let mut font = BitmapFont::with_display_lists(atlas(), 16, &mut r, 200);
        assert!(!font.is_caching());

        font.draw_string(&mut r, 0.0, 0.0, "AB", Color::WHITE).unwrap();
        font.draw_string(&mut r, 0.0, 0.0, "AB", Color::WHITE).unwrap();
        r.flush();
        assert_eq!(r.driver().vertices_drawn(), 16);
        assert_eq!(r.driver().list_count(), 0);
        assert_eq!(font.width("AB"), 14);
    }

    #[test]
    fn test_measurements_memoized_after_draw() {
        let mut r = RecordingBackend::new();
        let mut font = BitmapFont::with_display_lists(atlas(), 16, &mut r, 4);
        font.draw_string(&mut r, 0.0, 0.0, "AB", Color::WHITE).unwrap();
        assert_eq!(font.cache().unwrap().peek("AB").unwrap().cached_width(), None);
        assert_eq!(font.width("AB"), 14);
        assert_eq!(font.cache().unwrap().peek("AB").unwrap().cached_width(), Some(14));
        assert_eq!(font.cache().unwrap().peek("AB").unwrap().cached_height(), None);
    }

    #[test]
    fn test_color_not_captured_in_list() {
        let mut r = GeometryBatch::new(RecordingBackend::new(), BatchConfig::default());
        let mut font = BitmapFont::with_display_lists(atlas(), 16, &mut r, 4);
        font.draw_string(&mut r, 0.0, 0.0, "AB", Color::RED).unwrap();
        let handle = font.cache().unwrap().peek("AB").unwrap().handle();
        let list = r.driver().list(handle).unwrap();
        assert!(!list.iter().any(|c| matches!(c, DrawCommand::Color(_))));
    }
}
