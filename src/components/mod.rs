//! ECS components for entities.
//!
//! Submodules overview:
//! - [`animation`] – frame-based sprite animation and its playback state
//! - [`dynamictext`] – text drawn with a bitmap font from the font store
//! - [`mapposition`] – world-space position of an entity
//! - [`sprite`] – textured quad with size, origin, flip and tint
//! - [`zindex`] – rendering order hint for 2D drawing

pub mod animation;
pub mod dynamictext;
pub mod mapposition;
pub mod sprite;
pub mod zindex;
