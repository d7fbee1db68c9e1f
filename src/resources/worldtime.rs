use bevy_ecs::prelude::Resource;

/// Simulation clock, in seconds.
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(time_scale: f32) -> Self {
        WorldTime {
            time_scale,
            ..Default::default()
        }
    }

    /// Scaled delta of the current frame in milliseconds, the unit
    /// animations count in.
    pub fn delta_ms(&self) -> f32 {
        self.delta * 1000.0
    }
}
