//! slate2d library.
//!
//! Batched 2D rendering core: a geometry batcher sitting in front of a
//! low-level draw backend, images and sprite sheets drawn as textured quads,
//! frame-based sprite animation, and bitmap fonts whose strings are cached
//! as display lists. The ECS components, resources, systems and events wire
//! these into a `bevy_ecs` world.

pub mod components;
pub mod error;
pub mod events;
pub mod font;
pub mod image;
pub mod render;
pub mod resources;
pub mod spritesheet;
pub mod systems;
