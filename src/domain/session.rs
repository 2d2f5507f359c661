// Domain-level player identity, motion and session types.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Connection-bound player identity. Serialized as a decimal string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(PlayerId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or zero when the length is zero.
    pub fn normalize_or_zero(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            Vec3::new(self.x / len, self.y / len, self.z / len)
        } else {
            Vec3::default()
        }
    }

    pub fn distance(self, other: Vec3) -> f32 {
        self.sub(other).length()
    }
}

/// Heading about the vertical axis, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub y: f32,
}

/// Spawn point for every freshly joined player.
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 0.5, 0.0);

pub const DEFAULT_PLAYER_NAME: &str = "Gracz";
pub const DEFAULT_CAR_COLOR: &str = "#44caff";
pub const ANONYMOUS_CHAT_NAME: &str = "Anon";

/// Server-side record of one connected, joined player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSession {
    pub id: PlayerId,
    pub name: String,
    pub car_id: String,
    pub color: String,
    pub position: Vec3,
    pub rotation: Rotation,
    pub speed: f32,
}

/// Join handshake fields as received; any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinRequest {
    pub name: Option<String>,
    pub car_id: Option<String>,
    pub color: Option<String>,
}

/// Motion fields a client reports about its own car.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReport {
    pub position: Vec3,
    pub rotation: Rotation,
    pub speed: f32,
}

impl PlayerSession {
    /// Builds a session at the spawn point, substituting defaults for missing
    /// or blank join fields.
    pub fn spawn(id: PlayerId, request: JoinRequest, default_car_id: &str) -> Self {
        Self {
            id,
            name: non_blank(request.name).unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string()),
            car_id: non_blank(request.car_id).unwrap_or_else(|| default_car_id.to_string()),
            color: non_blank(request.color).unwrap_or_else(|| DEFAULT_CAR_COLOR.to_string()),
            position: SPAWN_POSITION,
            rotation: Rotation::default(),
            speed: 0.0,
        }
    }

    /// Overwrites motion fields verbatim; reported values are not range checked.
    pub fn apply_motion(&mut self, report: MotionReport) {
        self.position = report.position;
        self.rotation = report.rotation;
        self.speed = report.speed;
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
