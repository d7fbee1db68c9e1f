//! Engine error types.
//!
//! Every variant is a configuration error: something the game set up wrong
//! (a zero-length frame, a sprite index outside its sheet, drawing with no
//! render context). They are surfaced at the call that detects them and
//! propagated with `?` up to the game loop.
//!
//! Recoverable resource shortages (display list allocation failing, a batch
//! overflowing its buffers) are not errors; they log a warning and fall back.

/// Result alias used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal configuration errors raised by the rendering core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A frame was added with a zero duration.
    InvalidDuration,
    /// A frame index outside `[0, frame_count)` was requested.
    FrameIndexOutOfRange { index: usize, count: usize },
    /// A sprite sheet cell outside the grid was requested.
    CellOutOfBounds {
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    },
    /// The sheet geometry leaves no room for a single tile.
    InvalidSheet(String),
    /// A glyph code outside the atlas table was requested.
    GlyphOutOfRange(u32),
    /// The atlas has no glyph for this code.
    MissingGlyph(u32),
    /// Geometry was submitted while no render context is current.
    NoRenderContext,
    /// Invalid configuration value.
    Config(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidDuration => write!(f, "Invalid frame duration: 0"),
            EngineError::FrameIndexOutOfRange { index, count } => {
                write!(f, "Frame index {} out of range (frames: {})", index, count)
            }
            EngineError::CellOutOfBounds {
                col,
                row,
                cols,
                rows,
            } => write!(
                f,
                "SubImage out of sheet bounds: {},{} (sheet is {}x{})",
                col, row, cols, rows
            ),
            EngineError::InvalidSheet(msg) => write!(f, "Invalid sprite sheet: {}", msg),
            EngineError::GlyphOutOfRange(code) => write!(f, "Glyph code {} out of range", code),
            EngineError::MissingGlyph(code) => write!(f, "No glyph for code {}", code),
            EngineError::NoRenderContext => {
                write!(f, "No render context: geometry can only be drawn from init or the game loop")
            }
            EngineError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_indices() {
        let err = EngineError::CellOutOfBounds {
            col: 4,
            row: 0,
            cols: 4,
            rows: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("4,0"));
        assert!(msg.contains("4x2"));
    }

    #[test]
    fn test_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&EngineError::NoRenderContext);
    }
}
