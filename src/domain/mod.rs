// Domain layer: car catalog, sessions and the local driving model.

pub mod catalog;
pub mod controls;
pub mod physics;
pub mod ports;
pub mod remote;
pub mod session;
pub mod tuning;

pub use catalog::{CarCatalog, CarConfig, CatalogError};
pub use controls::{Control, ControlMode, ControlState};
pub use physics::{LocalPhysicsSimulator, LocalSimulationState, Obstacle, ObstacleField};
pub use ports::{Clock, SystemClock};
pub use remote::{RemoteSnapshot, RemoteStateCache};
pub use session::{JoinRequest, MotionReport, PlayerId, PlayerSession, Rotation, Vec3};
pub use tuning::{DrivingTuning, ObstacleTuning};
