// Dead-reckoning model for the local player's own car.

use crate::domain::catalog::CarConfig;
use crate::domain::controls::{ControlMode, ControlState};
use crate::domain::session::{MotionReport, PlayerSession, Rotation, Vec3};
use crate::domain::tuning::{DrivingTuning, ObstacleTuning};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Client-owned motion state of the local car.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSimulationState {
    pub car_id: String,
    pub position: Vec3,
    pub rotation: Rotation,
    pub speed: f32,
    /// 0.0..=1.0
    pub nitro: f32,
}

impl LocalSimulationState {
    /// Seeds local state from the server's join confirmation.
    pub fn from_session(session: &PlayerSession, initial_nitro: f32) -> Self {
        Self {
            car_id: session.car_id.clone(),
            position: session.position,
            rotation: session.rotation,
            speed: session.speed,
            nitro: initial_nitro,
        }
    }

    pub fn report(&self) -> MotionReport {
        MotionReport {
            position: self.position,
            rotation: self.rotation,
            speed: self.speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Vec3,
}

/// Static boxes the car bounces off.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    /// Scatters obstacles with a seeded RNG so a given seed always yields the same track.
    pub fn generate(seed: u64, tuning: ObstacleTuning) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let half = tuning.spread / 2.0;
        let obstacles = (0..tuning.count)
            .map(|_| Obstacle {
                position: Vec3::new(
                    rng.gen_range(-half..half),
                    tuning.height,
                    rng.gen_range(-half..half),
                ),
            })
            .collect();
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

/// Advances the local car once per frame from held controls.
#[derive(Debug, Clone, Default)]
pub struct LocalPhysicsSimulator {
    tuning: DrivingTuning,
    obstacles: ObstacleField,
}

impl LocalPhysicsSimulator {
    pub fn new(tuning: DrivingTuning, obstacles: ObstacleField) -> Self {
        Self { tuning, obstacles }
    }

    pub fn tuning(&self) -> &DrivingTuning {
        &self.tuning
    }

    /// Integrates one frame of `dt` seconds. Returns how many obstacles were touched.
    pub fn advance(
        &self,
        state: &mut LocalSimulationState,
        controls: &ControlState,
        mode: ControlMode,
        car: &CarConfig,
        dt: f32,
    ) -> usize {
        let t = &self.tuning;
        // Obstacle checks use where the car was drawn last frame.
        let rendered = state.position;

        // throttle / brake / coast
        if controls.forward {
            state.speed += car.acceleration * dt;
        }
        if controls.backward {
            state.speed -= car.acceleration * t.reverse_accel_ratio * dt;
        }
        if !controls.forward && !controls.backward {
            state.speed *= t.coast_decay;
        }

        // nitro burn or regeneration
        if controls.nitro && state.nitro > 0.0 {
            state.speed += car.acceleration * t.nitro_boost_ratio * dt;
            state.nitro = (state.nitro - t.nitro_drain_rate * dt).max(0.0);
        } else {
            state.nitro = (state.nitro + t.nitro_regen_rate * dt).min(1.0);
        }

        state.speed = state
            .speed
            .clamp(-car.max_speed * t.reverse_speed_ratio, car.max_speed);

        // steering
        let drift_factor = if controls.drift || mode == ControlMode::Drift {
            t.drift_turn_factor
        } else {
            1.0
        };
        state.rotation.y += controls.turn_input()
            * car.handling
            * drift_factor
            * dt
            * (state.speed / car.max_speed + t.min_turn_floor);

        // +Z rotated about the vertical axis
        let heading_x = state.rotation.y.sin();
        let heading_z = state.rotation.y.cos();
        let travel = state.speed * dt * t.world_scale;
        state.position.x += heading_x * travel;
        state.position.z += heading_z * travel;
        self.clamp_to_world(state);

        let mut touched = 0;
        for obstacle in self.obstacles.obstacles() {
            if obstacle.position.distance(rendered) < t.obstacle_radius {
                let push = rendered.sub(obstacle.position).normalize_or_zero();
                state.position.x += push.x * t.obstacle_push;
                state.position.z += push.z * t.obstacle_push;
                state.speed *= t.obstacle_speed_damping;
                touched += 1;
            }
        }
        if touched > 0 {
            self.clamp_to_world(state);
        }

        touched
    }

    fn clamp_to_world(&self, state: &mut LocalSimulationState) {
        let bounds = self.tuning.world_bounds;
        state.position.x = state.position.x.clamp(-bounds, bounds);
        state.position.z = state.position.z.clamp(-bounds, bounds);
    }
}
