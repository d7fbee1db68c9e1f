//! Sprite sheets.
//!
//! A [`SpriteSheet`] cuts one image into a grid of equally sized tiles,
//! optionally separated by `spacing` pixels and surrounded by a `margin`.
//! Cells are addressed by `(col, row)` and materialised as [`Image`]
//! regions the first time they are asked for.
//!
//! Grid size is computed once:
//!
//! ```text
//! cols = (width  - 2 * margin - tile_w) / (tile_w + spacing) + 1
//! rows = (height - 2 * margin - tile_h) / (tile_h + spacing) + 1
//!        (+1 when (height - tile_h) % (tile_h + spacing) != 0)
//! ```
//!
//! The extra row keeps a partial trailing row addressable.

use std::sync::OnceLock;

use crate::error::{EngineError, EngineResult};
use crate::image::Image;
use crate::render::{Color, Primitive, RenderBackend};

#[derive(Debug)]
pub struct SpriteSheet {
    image: Image,
    tile_width: u32,
    tile_height: u32,
    spacing: u32,
    margin: u32,
    cols: usize,
    rows: usize,
    cells: Box<[OnceLock<Image>]>,
}

impl SpriteSheet {
    pub fn new(image: Image, tile_width: u32, tile_height: u32) -> EngineResult<Self> {
        Self::with_spacing(image, tile_width, tile_height, 0, 0)
    }

    pub fn with_spacing(
        image: Image,
        tile_width: u32,
        tile_height: u32,
        spacing: u32,
        margin: u32,
    ) -> EngineResult<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(EngineError::InvalidSheet(format!(
                "tile size {}x{}",
                tile_width, tile_height
            )));
        }
        let width = image.width() as i64;
        let height = image.height() as i64;
        let (tw, th) = (tile_width as i64, tile_height as i64);
        let (spacing_i, margin_i) = (spacing as i64, margin as i64);

        let free_w = width - 2 * margin_i - tw;
        let free_h = height - 2 * margin_i - th;
        if free_w < 0 || free_h < 0 {
            return Err(EngineError::InvalidSheet(format!(
                "{}x{} tiles with margin {} do not fit a {}x{} image",
                tile_width, tile_height, margin, width, height
            )));
        }

        let cols = free_w / (tw + spacing_i) + 1;
        let mut rows = free_h / (th + spacing_i) + 1;
        if (height - th) % (th + spacing_i) != 0 {
            rows += 1;
        }
        let (cols, rows) = (cols as usize, rows as usize);

        log::debug!(
            "Sprite sheet {}x{} cut into {}x{} tiles of {}x{}",
            width,
            height,
            cols,
            rows,
            tile_width,
            tile_height
        );

        Ok(Self {
            image,
            tile_width,
            tile_height,
            spacing,
            margin,
            cols,
            rows,
            cells: (0..cols * rows).map(|_| OnceLock::new()).collect(),
        })
    }

    pub fn horizontal_count(&self) -> usize {
        self.cols
    }

    pub fn vertical_count(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// The cell at `(col, row)`.
    pub fn cell(&self, col: usize, row: usize) -> EngineResult<&Image> {
        if col >= self.cols || row >= self.rows {
            log::error!("SubImage out of sheet bounds: {},{}", col, row);
            return Err(EngineError::CellOutOfBounds {
                col,
                row,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(self.cells[row * self.cols + col].get_or_init(|| {
            self.image.sub_image(
                self.margin + col as u32 * (self.tile_width + self.spacing),
                self.margin + row as u32 * (self.tile_height + self.spacing),
                self.tile_width,
                self.tile_height,
            )
        }))
    }

    /// Draw a single cell at its natural size.
    pub fn draw_cell(
        &self,
        renderer: &mut dyn RenderBackend,
        x: f32,
        y: f32,
        col: usize,
        row: usize,
        color: Color,
    ) -> EngineResult<()> {
        self.cell(col, row)?.draw(renderer, x, y, color)
    }

    /// Bind the sheet and open a quad block for [`SpriteSheet::render_in_use`].
    pub fn start_use(&self, renderer: &mut dyn RenderBackend, color: Color) -> EngineResult<()> {
        self.image.bind(renderer);
        renderer.color(color);
        renderer.begin(Primitive::Quads)
    }

    /// Emit a cell into the block opened by [`SpriteSheet::start_use`].
    pub fn render_in_use(
        &self,
        renderer: &mut dyn RenderBackend,
        x: f32,
        y: f32,
        col: usize,
        row: usize,
    ) -> EngineResult<()> {
        let cell = self.cell(col, row)?;
        cell.draw_embedded(
            renderer,
            x,
            y,
            self.tile_width as f32,
            self.tile_height as f32,
        );
        Ok(())
    }

    pub fn end_use(&self, renderer: &mut dyn RenderBackend) {
        renderer.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Texture;
    use crate::render::{BatchConfig, GeometryBatch, RecordingBackend};

    fn sheet(w: u32, h: u32, tw: u32, th: u32, spacing: u32, margin: u32) -> SpriteSheet {
        SpriteSheet::with_spacing(Image::new(Texture::exact(1, w, h)), tw, th, spacing, margin).unwrap()
    }

    #[test]
    fn test_even_grid() {
        let s = sheet(64, 32, 16, 16, 0, 0);
        assert_eq!((s.horizontal_count(), s.vertical_count()), (4, 2));
    }

    #[test]
    fn test_partial_trailing_row_is_addressable() {
        let s = sheet(64, 40, 16, 16, 0, 0);
        assert_eq!(s.vertical_count(), 3);
        assert!(s.cell(0, 2).is_ok());
    }

    #[test]
    fn test_spacing_and_margin() {
        // 2 + 16 + 2 + 16 + 2 + 16 + 2 = 56
        let s = sheet(56, 20, 16, 16, 2, 2);
        assert_eq!(s.horizontal_count(), 3);
        assert_eq!(s.cell(2, 0).unwrap().origin(), (38, 2));
    }

    #[test]
    fn test_last_cell_ok_and_out_of_bounds_fails() {
        let s = sheet(64, 32, 16, 16, 0, 0);
        let (cols, rows) = (s.horizontal_count(), s.vertical_count());
        assert!(s.cell(cols - 1, rows - 1).is_ok());
        assert_eq!(
            s.cell(cols, 0),
            Err(EngineError::CellOutOfBounds {
                col: 4,
                row: 0,
                cols: 4,
                rows: 2
            })
        );
        assert!(s.cell(0, rows).is_err());
    }

    #[test]
    fn test_cells_are_memoized() {
        let s = sheet(64, 32, 16, 16, 0, 0);
        let a = s.cell(1, 1).unwrap() as *const Image;
        let b = s.cell(1, 1).unwrap() as *const Image;
        assert_eq!(a, b);
    }

    #[test]
    fn test_tile_larger_than_image_rejected() {
        let err = SpriteSheet::new(Image::new(Texture::exact(1, 8, 8)), 16, 16);
        assert!(matches!(err, Err(EngineError::InvalidSheet(_))));
    }

    #[test]
    fn test_in_use_cells_share_one_draw() {
        let s = sheet(64, 32, 16, 16, 0, 0);
        let mut r = GeometryBatch::new(RecordingBackend::new(), BatchConfig::default());
        s.start_use(&mut r, Color::WHITE).unwrap();
        for col in 0..4 {
            s.render_in_use(&mut r, col as f32 * 16.0, 0.0, col, 0).unwrap();
        }
        s.end_use(&mut r);
        r.flush();
        assert_eq!(r.driver().draw_calls(), 1);
        assert_eq!(r.driver().vertices_drawn(), 16);
    }
}
