//! Glyph records and the glyph atlas.
//!
//! Glyph definitions come from a BMFont-style description parsed outside the
//! engine. Each [`Glyph`] keeps its kerning pairs in a short sorted table of
//! packed `i16` values, `(offset << 8) | second_code`, searched with a plain
//! binary search.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};
use crate::image::Image;
use crate::render::RenderBackend;

/// Highest character code an atlas can hold.
pub const MAX_CHAR: u32 = 255;

/// One glyph record as delivered by the font description parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphDef {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub xoffset: i32,
    #[serde(default)]
    pub yoffset: i32,
    pub xadvance: i32,
    /// `(second_code, offset)` pairs, in any order.
    #[serde(default)]
    pub kerning: Vec<(u32, i32)>,
}

#[derive(Debug)]
pub struct Glyph {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub xoffset: i32,
    pub yoffset: i32,
    pub xadvance: i32,
    kerning: SmallVec<[i16; 8]>,
    image: OnceLock<Image>,
}

impl Glyph {
    pub fn new(def: &GlyphDef) -> Self {
        let mut kerning: SmallVec<[i16; 8]> = def
            .kerning
            .iter()
            .filter_map(|&(second, offset)| {
                if second > MAX_CHAR {
                    return None;
                }
                let clamped = offset.clamp(i8::MIN as i32, i8::MAX as i32);
                if clamped != offset {
                    log::warn!(
                        "Kerning {}->{} of {} clamped to {}",
                        def.id,
                        second,
                        offset,
                        clamped
                    );
                }
                Some(((clamped as i16) << 8) | second as i16)
            })
            .collect();
        kerning.sort_unstable_by_key(|&packed| packed & 0xff);

        Self {
            id: def.id,
            x: def.x,
            y: def.y,
            width: def.width,
            height: def.height,
            xoffset: def.xoffset,
            yoffset: def.yoffset,
            xadvance: def.xadvance,
            kerning,
            image: OnceLock::new(),
        }
    }

    /// Horizontal adjustment when `other` follows this glyph; `0` without an
    /// entry.
    pub fn kerning(&self, other: u32) -> i32 {
        let table = &self.kerning;
        let mut low = 0usize;
        let mut high = table.len();
        while low < high {
            let mid = (low + high) / 2;
            let packed = table[mid];
            let code = (packed & 0xff) as u32;
            if code < other {
                low = mid + 1;
            } else if code > other {
                high = mid;
            } else {
                return (packed >> 8) as i32;
            }
        }
        0
    }

    /// Region of the font page holding this glyph, cut on first use.
    pub fn image(&self, page: &Image) -> &Image {
        self.image
            .get_or_init(|| page.sub_image(self.x, self.y, self.width, self.height))
    }

    /// Emit this glyph's quad with its pen position at `(x, y)`, inside an
    /// open quad block.
    pub fn draw_embedded(&self, renderer: &mut dyn RenderBackend, page: &Image, x: i32, y: i32) {
        self.image(page).draw_embedded(
            renderer,
            (x + self.xoffset) as f32,
            (y + self.yoffset) as f32,
            self.width as f32,
            self.height as f32,
        );
    }
}

/// Glyphs of one font page, indexed by character code.
#[derive(Debug)]
pub struct GlyphAtlas {
    page: Image,
    glyphs: Vec<Option<Glyph>>,
}

impl GlyphAtlas {
    pub fn new(page: Image, defs: &[GlyphDef]) -> Self {
        let mut glyphs: Vec<Option<Glyph>> = (0..=MAX_CHAR).map(|_| None).collect();
        for def in defs {
            if def.id > MAX_CHAR {
                log::debug!("Skipping glyph {} beyond code {}", def.id, MAX_CHAR);
                continue;
            }
            glyphs[def.id as usize] = Some(Glyph::new(def));
        }
        Self { page, glyphs }
    }

    pub fn page(&self) -> &Image {
        &self.page
    }

    /// Glyph for `code`, if the font has one.
    pub fn glyph(&self, code: u32) -> Option<&Glyph> {
        self.glyphs.get(code as usize).and_then(Option::as_ref)
    }

    /// Glyph for `code`, failing when it is out of range or absent.
    pub fn try_glyph(&self, code: u32) -> EngineResult<&Glyph> {
        if code > MAX_CHAR {
            return Err(EngineError::GlyphOutOfRange(code));
        }
        self.glyph(code).ok_or(EngineError::MissingGlyph(code))
    }

    /// Image of the glyph for `code`, cut from the page on first request.
    pub fn glyph_image(&self, code: u32) -> EngineResult<&Image> {
        Ok(self.try_glyph(code)?.image(&self.page))
    }

    pub fn kerning(&self, first: u32, second: u32) -> i32 {
        self.glyph(first).map_or(0, |g| g.kerning(second))
    }

    /// Number of defined glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.iter().filter(|g| g.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
