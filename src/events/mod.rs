//! Messages exchanged across systems.
//!
//! Submodules:
//! - [`animation`] – notification that a non-looping animation came to rest
pub mod animation;
