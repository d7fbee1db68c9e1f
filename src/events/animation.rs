//! Animation playback messages.
//!
//! The [`animation`](crate::systems::animation::animation) system writes an
//! [`AnimationFinished`] when an entity's animation stops by itself (last
//! frame of a non-looping animation, its stop frame, or a non-looping
//! ping-pong back home). Stopping it by hand does not produce one.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFinished {
    pub entity: Entity,
    /// Frame the animation stopped on.
    pub frame: usize,
}
