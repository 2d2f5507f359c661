/// Gameplay tuning for the local driving model.
///
/// Keep this separate from runtime/server configuration (ports, channel sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct DrivingTuning {
    /// Fraction of acceleration applied while braking/reversing.
    pub reverse_accel_ratio: f32,

    /// Per-frame speed multiplier while coasting.
    pub coast_decay: f32,

    /// Extra acceleration, as a multiple of the car's acceleration, while nitro burns.
    pub nitro_boost_ratio: f32,

    /// Nitro consumed per second while burning.
    pub nitro_drain_rate: f32,

    /// Nitro regained per second while not burning.
    pub nitro_regen_rate: f32,

    /// Nitro level a freshly joined car starts with.
    pub initial_nitro: f32,

    /// Top reverse speed as a fraction of max speed.
    pub reverse_speed_ratio: f32,

    /// Turn multiplier while drifting.
    pub drift_turn_factor: f32,

    /// Turn authority floor so a near-stationary car can still steer.
    pub min_turn_floor: f32,

    /// World units travelled per unit of speed per second.
    pub world_scale: f32,

    /// Half-extent of the drivable square on x and z.
    pub world_bounds: f32,

    /// Distance at which an obstacle pushes the car away.
    pub obstacle_radius: f32,

    /// Fixed displacement applied per touching obstacle.
    pub obstacle_push: f32,

    /// Speed multiplier per touching obstacle.
    pub obstacle_speed_damping: f32,
}

impl Default for DrivingTuning {
    fn default() -> Self {
        Self {
            reverse_accel_ratio: 0.6,
            coast_decay: 0.98,
            nitro_boost_ratio: 1.6,
            nitro_drain_rate: 0.35,
            nitro_regen_rate: 0.1,
            initial_nitro: 0.6,
            reverse_speed_ratio: 0.3,
            drift_turn_factor: 0.65,
            min_turn_floor: 0.4,
            world_scale: 2.2,
            world_bounds: 900.0,
            obstacle_radius: 8.0,
            obstacle_push: 2.5,
            obstacle_speed_damping: 0.4,
        }
    }
}

/// Layout of the static obstacle field scattered around the track.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleTuning {
    pub count: usize,
    /// Obstacles are placed uniformly in `[-spread / 2, spread / 2)` on x and z.
    pub spread: f32,
    /// Height of each obstacle's centre.
    pub height: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            count: 40,
            spread: 700.0,
            height: 5.0,
        }
    }
}
