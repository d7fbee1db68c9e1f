//! Render configuration resource.
//!
//! Renderer, font cache and window settings loaded from an INI file. Missing
//! keys keep their defaults, so an empty or absent file is a valid setup.
//!
//! # Configuration File Format
//!
//! ```ini
//! [renderer]
//! kind = vertex_array
//! max_vertices = 5000
//! safety_margin = 50
//! flush_tolerance = 20
//!
//! [font]
//! display_list_caching = true
//! display_list_cache_size = 200
//!
//! [window]
//! width = 1280
//! height = 720
//! target_fps = 60
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::font::DEFAULT_CACHE_SIZE;
use crate::render::{BatchConfig, RendererKind};

const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct RenderConfig {
    pub renderer: RendererKind,
    pub batch: BatchConfig,
    /// Cache whole strings in display lists.
    pub display_list_caching: bool,
    /// Strings cached per font.
    pub display_list_cache_size: usize,
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: u32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderConfig {
    /// Configuration with safe default values.
    pub fn new() -> Self {
        Self {
            renderer: RendererKind::default(),
            batch: BatchConfig::default(),
            display_list_caching: true,
            display_list_cache_size: DEFAULT_CACHE_SIZE,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file at `config_path`.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [renderer] section
        if let Some(kind) = config.get("renderer", "kind") {
            match kind.parse::<RendererKind>() {
                Ok(kind) => self.renderer = kind,
                Err(e) => warn!("Ignoring renderer kind: {}", e),
            }
        }
        if let Some(max) = config.getuint("renderer", "max_vertices").ok().flatten() {
            self.batch.max_vertices = max as usize;
        }
        if let Some(margin) = config.getuint("renderer", "safety_margin").ok().flatten() {
            self.batch.safety_margin = margin as usize;
        }
        if let Some(tolerance) = config.getuint("renderer", "flush_tolerance").ok().flatten() {
            self.batch.flush_tolerance = tolerance as usize;
        }
        if self.batch.max_vertices == 0 || self.batch.safety_margin >= self.batch.max_vertices {
            warn!(
                "Batch limits max_vertices={} safety_margin={} leave no room; using defaults",
                self.batch.max_vertices, self.batch.safety_margin
            );
            self.batch = BatchConfig::default();
        }

        // [font] section
        if let Some(caching) = config.getbool("font", "display_list_caching").ok().flatten() {
            self.display_list_caching = caching;
        }
        if let Some(size) = config.getuint("font", "display_list_cache_size").ok().flatten() {
            self.display_list_cache_size = size as usize;
        }

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }

        info!(
            "Loaded config: {:?} renderer (max {} vertices), font cache {} x{}, {}x{} window, fps={}",
            self.renderer,
            self.batch.max_vertices,
            if self.display_list_caching { "on" } else { "off" },
            self.display_list_cache_size,
            self.window_width,
            self.window_height,
            self.target_fps
        );
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        self.to_ini()
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;
        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }

    fn to_ini(&self) -> Ini {
        let mut config = Ini::new();
        let kind = match self.renderer {
            RendererKind::Immediate => "immediate",
            RendererKind::VertexArray => "vertex_array",
        };
        config.set("renderer", "kind", Some(kind.to_string()));
        config.set("renderer", "max_vertices", Some(self.batch.max_vertices.to_string()));
        config.set("renderer", "safety_margin", Some(self.batch.safety_margin.to_string()));
        config.set("renderer", "flush_tolerance", Some(self.batch.flush_tolerance.to_string()));

        config.set("font", "display_list_caching", Some(self.display_list_caching.to_string()));
        config.set("font", "display_list_cache_size", Some(self.display_list_cache_size.to_string()));

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config
    }

    /// Cache size fonts should be created with, `None` when caching is off.
    pub fn font_cache_size(&self) -> Option<usize> {
        (self.display_list_caching && self.display_list_cache_size > 0)
            .then_some(self.display_list_cache_size)
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RenderConfig::new();
        assert_eq!(c.renderer, RendererKind::VertexArray);
        assert_eq!(c.batch, BatchConfig::default());
        assert_eq!(c.font_cache_size(), Some(200));
    }

    #[test]
    fn test_load_overrides_present_keys_only() {
        let mut c = RenderConfig::new();
        c.load_from_str(
            "[renderer]\nkind = immediate\nflush_tolerance = 8\n\n[font]\ndisplay_list_cache_size = 32\n",
        )
        .unwrap();
        assert_eq!(c.renderer, RendererKind::Immediate);
        assert_eq!(c.batch.flush_tolerance, 8);
        assert_eq!(c.batch.max_vertices, 5000);
        assert_eq!(c.font_cache_size(), Some(32));
        assert_eq!(c.window_size(), (1280, 720));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let mut c = RenderConfig::new();
        c.load_from_str("[renderer]\nkind = vulkan\nmax_vertices = 10\nsafety_margin = 10\n")
            .unwrap();
        assert_eq!(c.renderer, RendererKind::VertexArray);
        assert_eq!(c.batch, BatchConfig::default());
    }

    #[test]
    fn test_caching_off() {
        let mut c = RenderConfig::new();
        c.load_from_str("[font]\ndisplay_list_caching = false\n").unwrap();
        assert_eq!(c.font_cache_size(), None);
    }

    #[test]
    fn test_missing_file_is_error() {
        let mut c = RenderConfig::with_path("/nonexistent/slate2d.ini");
        assert!(c.load_from_file().is_err());
        assert_eq!(c.target_fps, 60);
    }

    #[test]
    fn test_round_trip_through_ini_text() {
        let mut c = RenderConfig::new();
        c.renderer = RendererKind::Immediate;
        c.target_fps = 30;
        let text = c.to_ini().writes();
        let mut loaded = RenderConfig::new();
        loaded.load_from_str(&text).unwrap();
        assert_eq!(loaded.renderer, RendererKind::Immediate);
        assert_eq!(loaded.target_fps, 30);
    }
}
