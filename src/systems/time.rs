//! Time update system.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per frame, applying `time_scale` to the provided delta.
use bevy_ecs::prelude::*;

use crate::resources::worldtime::WorldTime;

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is expected to be the unscaled frame delta in seconds. The system
/// applies the current `time_scale` and writes both `elapsed` and `delta`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale_applies_to_delta() {
        let mut world = World::new();
        world.insert_resource(WorldTime::with_time_scale(0.5));
        update_world_time(&mut world, 0.1);
        update_world_time(&mut world, 0.1);
        let wt = world.resource::<WorldTime>();
        assert!((wt.delta - 0.05).abs() < 1e-6);
        assert!((wt.elapsed - 0.1).abs() < 1e-6);
        assert!((wt.delta_ms() - 50.0).abs() < 1e-3);
        assert_eq!(wt.frame_count, 2);
    }
}
