use crate::domain::{CarCatalog, CarConfig, CatalogError};
use crate::use_cases::ReportPolicy;

use serde::Deserialize;
use std::{env, fmt, path::Path, time::Duration};

// Runtime/server constants (not driving tuning).

pub fn http_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const RELAY_BROADCAST_CAPACITY: usize = 256;

pub const FRAME_INTERVAL: Duration = Duration::from_micros(1_000_000 / 60);
pub const CLIENT_OUTBOUND_CAPACITY: usize = 8;
// How often the client logs its dashboard line.
pub const HUD_LOG_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: String,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Catalog(CatalogError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => write!(f, "failed to read {path}: {source}"),
            ConfigError::Parse(e) => write!(f, "invalid car catalog: {e}"),
            ConfigError::Catalog(CatalogError::Empty) => write!(f, "car catalog has no cars"),
            ConfigError::Catalog(CatalogError::DuplicateId(id)) => {
                write!(f, "car catalog lists `{id}` twice")
            }
            ConfigError::Catalog(CatalogError::InvalidCar(id)) => {
                write!(f, "car `{id}` needs finite tuning and a positive max_speed")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    cars: Vec<CarEntry>,
}

#[derive(Debug, Deserialize)]
struct CarEntry {
    id: String,
    name: String,
    max_speed: f32,
    acceleration: f32,
    handling: f32,
}

/// Built-in catalog unless `CARS_FILE` points at a TOML replacement.
pub fn car_catalog() -> Result<CarCatalog, ConfigError> {
    match env::var("CARS_FILE") {
        Ok(path) if !path.trim().is_empty() => load_catalog(Path::new(path.trim())),
        _ => Ok(CarCatalog::builtin()),
    }
}

pub fn load_catalog(path: &Path) -> Result<CarCatalog, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_catalog(&text)
}

pub fn parse_catalog(text: &str) -> Result<CarCatalog, ConfigError> {
    let file: CatalogFile = toml::from_str(text).map_err(ConfigError::Parse)?;
    let cars = file
        .cars
        .into_iter()
        .map(|c| CarConfig::new(c.id, c.name, c.max_speed, c.acceleration, c.handling))
        .collect();
    CarCatalog::new(cars).map_err(ConfigError::Catalog)
}

/// Settings for the headless driving client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub name: Option<String>,
    pub car_id: Option<String>,
    pub color: Option<String>,
    pub report_policy: ReportPolicy,
    pub obstacle_seed: u64,
    pub autojoin: bool,
}

pub fn client_config() -> ClientConfig {
    let defaults = ReportPolicy::default();
    ClientConfig {
        server_url: env::var("RACER_SERVER_URL")
            .unwrap_or_else(|_| "ws://127.0.0.1:3000/ws".to_string()),
        name: env::var("RACER_NAME").ok(),
        car_id: env::var("RACER_CAR").ok(),
        color: env::var("RACER_COLOR").ok(),
        report_policy: ReportPolicy {
            min_interval: env_millis("RACER_REPORT_INTERVAL_MS").unwrap_or(defaults.min_interval),
            heartbeat: env_millis("RACER_HEARTBEAT_MS").unwrap_or(defaults.heartbeat),
        },
        obstacle_seed: env::var("RACER_OBSTACLE_SEED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7),
        autojoin: env::var("RACER_AUTOJOIN")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(true),
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
