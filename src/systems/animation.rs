//! Animation systems.
//!
//! - [`animation`] advances every [`Animation`] component by the scaled
//!   frame delta and reports animations that just finished.
//! - [`update_animation_messages`] rotates the [`AnimationFinished`] queue.

use bevy_ecs::prelude::*;

use crate::components::animation::Animation;
use crate::events::animation::AnimationFinished;
use crate::resources::worldtime::WorldTime;

/// Advance animation playback.
///
/// Reads [`WorldTime`] for the scaled delta (seconds, converted to the
/// milliseconds animations count in). Writes [`AnimationFinished`] for each
/// animation that was playing before this tick and is stopped after it.
pub fn animation(
    mut query: Query<(Entity, &mut Animation)>,
    time: Res<WorldTime>,
    mut finished: MessageWriter<AnimationFinished>,
) {
    let delta_ms = time.delta_ms();
    for (entity, mut anim) in query.iter_mut() {
        if anim.is_stopped() {
            continue;
        }
        anim.advance(delta_ms);
        if anim.is_stopped() {
            log::debug!(
                "Animation on {:?} finished at frame {}",
                entity,
                anim.current_frame_index()
            );
            finished.write(AnimationFinished {
                entity,
                frame: anim.current_frame_index(),
            });
        }
    }
}

/// Advance the ECS message queue for [`AnimationFinished`].
///
/// Call once per frame so readers see each message for exactly one update.
pub fn update_animation_messages(mut msgs: ResMut<Messages<AnimationFinished>>) {
    msgs.update();
}
