//! ECS resources made available to systems.
//!
//! Overview
//! - `animationstore` – sprite sheets and animation definitions reused across entities
//! - `fontstore` – loaded bitmap fonts keyed by string IDs
//! - `renderconfig` – renderer selection, batch limits and window settings from INI
//! - `texturestore` – loaded textures keyed by name and load flags
//! - `worldtime` – simulation time and delta
pub mod animationstore;
pub mod fontstore;
pub mod renderconfig;
pub mod texturestore;
pub mod worldtime;
