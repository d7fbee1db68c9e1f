//! Engine systems.
//!
//! Submodules overview
//! - [`animation`] – advance sprite animations from world time
//! - [`render`] – draw sprites and text back to front through a render backend
//! - [`time`] – update simulation time and delta

pub mod animation;
pub mod render;
pub mod time;
