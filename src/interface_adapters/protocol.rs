// Wire protocol DTOs and conversions for the realtime relay.
// Every frame is `{"type": <event>, "data": <payload>}`; ids travel as decimal strings.

use crate::domain::{
    CarCatalog, CarConfig, CatalogError, JoinRequest, MotionReport, PlayerId, PlayerSession,
    Rotation, Vec3,
};
use crate::use_cases::{ChatLine, InitSnapshot, RelayBroadcast};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::num::ParseIntError;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Unicast to a fresh connection: identity, roster and car catalog.
    #[serde(rename = "init")]
    Init(InitDto),
    #[serde(rename = "player:joined")]
    PlayerJoined(PlayerSessionDto),
    #[serde(rename = "state:sync")]
    StateSync(PlayerSessionDto),
    // Identity of the connection that went away.
    #[serde(rename = "player:left")]
    PlayerLeft(String),
    #[serde(rename = "chat:message")]
    ChatMessage(ChatMessageDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Never rejected: `null`, non-objects and mistyped fields all fall back to defaults.
    #[serde(rename = "join")]
    Join(Option<JoinPayload>),
    #[serde(rename = "state:update")]
    StateUpdate(StateUpdatePayload),
    #[serde(rename = "chat:message")]
    Chat(Option<ChatPayload>),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3Dto {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationDto {
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSessionDto {
    pub id: String,
    pub name: String,
    pub car_id: String,
    pub color: String,
    pub position: Vec3Dto,
    pub rotation: RotationDto,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarConfigDto {
    pub id: String,
    pub name: String,
    pub max_speed: f32,
    pub acceleration: f32,
    pub handling: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitDto {
    pub id: String,
    pub players: Vec<PlayerSessionDto>,
    pub cars: Vec<CarConfigDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub id: String,
    pub name: String,
    pub text: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl<'de> Deserialize<'de> for JoinPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self {
            name: string_field(&value, "name"),
            car_id: string_field(&value, "carId"),
            color: string_field(&value, "color"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateUpdatePayload {
    pub position: Vec3Dto,
    pub rotation: RotationDto,
    #[serde(default)]
    pub speed: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatPayload {
    pub text: Option<String>,
}

impl<'de> Deserialize<'de> for ChatPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self {
            text: string_field(&value, "text"),
        })
    }
}

// Missing keys, non-object payloads and non-string values all read as absent.
fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Why an incoming server message could not be mapped onto domain types.
#[derive(Debug)]
pub enum ProtocolError {
    BadPlayerId(ParseIntError),
    BadCatalog(CatalogError),
}

impl From<ParseIntError> for ProtocolError {
    fn from(e: ParseIntError) -> Self {
        ProtocolError::BadPlayerId(e)
    }
}

impl From<Vec3> for Vec3Dto {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Dto> for Vec3 {
    fn from(v: Vec3Dto) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Rotation> for RotationDto {
    fn from(r: Rotation) -> Self {
        Self { y: r.y }
    }
}

impl From<RotationDto> for Rotation {
    fn from(r: RotationDto) -> Self {
        Rotation { y: r.y }
    }
}

impl From<&PlayerSession> for PlayerSessionDto {
    fn from(s: &PlayerSession) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            car_id: s.car_id.clone(),
            color: s.color.clone(),
            position: s.position.into(),
            rotation: s.rotation.into(),
            speed: s.speed,
        }
    }
}

impl TryFrom<PlayerSessionDto> for PlayerSession {
    type Error = ProtocolError;

    fn try_from(dto: PlayerSessionDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: dto.id.parse()?,
            name: dto.name,
            car_id: dto.car_id,
            color: dto.color,
            position: dto.position.into(),
            rotation: dto.rotation.into(),
            speed: dto.speed,
        })
    }
}

impl From<&CarConfig> for CarConfigDto {
    fn from(c: &CarConfig) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            max_speed: c.max_speed,
            acceleration: c.acceleration,
            handling: c.handling,
        }
    }
}

impl From<CarConfigDto> for CarConfig {
    fn from(c: CarConfigDto) -> Self {
        CarConfig::new(c.id, c.name, c.max_speed, c.acceleration, c.handling)
    }
}

impl From<&InitSnapshot> for InitDto {
    fn from(init: &InitSnapshot) -> Self {
        Self {
            id: init.id.to_string(),
            players: init.players.iter().map(PlayerSessionDto::from).collect(),
            cars: init.cars.cars().iter().map(CarConfigDto::from).collect(),
        }
    }
}

/// Client-side view of an `init` message.
#[derive(Debug, Clone)]
pub struct InitView {
    pub id: PlayerId,
    pub players: Vec<PlayerSession>,
    pub catalog: CarCatalog,
}

impl TryFrom<InitDto> for InitView {
    type Error = ProtocolError;

    fn try_from(dto: InitDto) -> Result<Self, Self::Error> {
        let players = dto
            .players
            .into_iter()
            .map(PlayerSession::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let catalog = CarCatalog::new(dto.cars.into_iter().map(CarConfig::from).collect())
            .map_err(ProtocolError::BadCatalog)?;
        Ok(Self {
            id: dto.id.parse()?,
            players,
            catalog,
        })
    }
}

impl From<&ChatLine> for ChatMessageDto {
    fn from(line: &ChatLine) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            text: line.text.clone(),
            timestamp: line.timestamp,
        }
    }
}

impl From<&RelayBroadcast> for ServerMessage {
    fn from(msg: &RelayBroadcast) -> Self {
        match msg {
            RelayBroadcast::PlayerJoined(s) => ServerMessage::PlayerJoined(s.into()),
            RelayBroadcast::StateSync(s) => ServerMessage::StateSync(s.into()),
            RelayBroadcast::PlayerLeft(id) => ServerMessage::PlayerLeft(id.to_string()),
            RelayBroadcast::Chat(line) => ServerMessage::ChatMessage(line.into()),
        }
    }
}

impl From<JoinPayload> for JoinRequest {
    fn from(p: JoinPayload) -> Self {
        Self {
            name: p.name,
            car_id: p.car_id,
            color: p.color,
        }
    }
}

impl From<JoinRequest> for JoinPayload {
    fn from(r: JoinRequest) -> Self {
        Self {
            name: r.name,
            car_id: r.car_id,
            color: r.color,
        }
    }
}

impl From<StateUpdatePayload> for MotionReport {
    fn from(p: StateUpdatePayload) -> Self {
        Self {
            position: p.position.into(),
            rotation: p.rotation.into(),
            speed: p.speed,
        }
    }
}

impl From<MotionReport> for StateUpdatePayload {
    fn from(r: MotionReport) -> Self {
        Self {
            position: r.position.into(),
            rotation: r.rotation.into(),
            speed: r.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn join_accepts_partial_and_null_payloads() {
        let partial: ClientMessage =
            serde_json::from_value(json!({"type": "join", "data": {"carId": "vortex"}}))
                .expect("partial join parses");
        assert_eq!(
            partial,
            ClientMessage::Join(Some(JoinPayload {
                car_id: Some("vortex".to_string()),
                ..JoinPayload::default()
            }))
        );

        let null: ClientMessage = serde_json::from_value(json!({"type": "join", "data": null}))
            .expect("null join parses");
        assert_eq!(null, ClientMessage::Join(None));
    }

    #[test]
    fn join_with_mistyped_fields_keeps_the_usable_ones() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"join","data":{"name":42,"carId":"falcon","color":123}}"#,
        )
        .expect("mistyped join still parses");
        assert_eq!(
            msg,
            ClientMessage::Join(Some(JoinPayload {
                car_id: Some("falcon".to_string()),
                ..JoinPayload::default()
            }))
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"join","data":"hello"}"#)
            .expect("non-object join still parses");
        assert_eq!(msg, ClientMessage::Join(Some(JoinPayload::default())));
    }

    #[test]
    fn chat_with_non_string_text_reads_as_empty() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"chat:message","data":{"text":7}}"#)
                .expect("chat parses");
        assert_eq!(msg, ClientMessage::Chat(Some(ChatPayload { text: None })));
    }

    #[test]
    fn init_with_undrivable_car_is_rejected_on_the_client_side() {
        let mut dto = InitDto::from(&InitSnapshot {
            id: PlayerId(1),
            players: Vec::new(),
            cars: Arc::new(CarCatalog::builtin()),
        });
        dto.cars[1].max_speed = 0.0;

        assert!(matches!(
            InitView::try_from(dto),
            Err(ProtocolError::BadCatalog(CatalogError::InvalidCar(ref id))) if id == "vortex"
        ));
    }

    #[test]
    fn state_update_parses_nested_motion() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "state:update",
            "data": {
                "position": {"x": 1.5, "y": 0.5, "z": -3.0},
                "rotation": {"y": 0.75},
                "speed": 20.0
            }
        }))
        .expect("state update parses");

        let ClientMessage::StateUpdate(payload) = msg else {
            panic!("expected state update");
        };
        let report = MotionReport::from(payload);
        assert_eq!(report.position, Vec3::new(1.5, 0.5, -3.0));
        assert_eq!(report.rotation.y, 0.75);
        assert_eq!(report.speed, 20.0);
    }

    #[test]
    fn session_serializes_with_camel_case_and_string_id() {
        let session = PlayerSession::spawn(PlayerId(77), JoinRequest::default(), "falcon");
        let value = serde_json::to_value(ServerMessage::PlayerJoined((&session).into()))
            .expect("serializes");

        assert_eq!(value["type"], "player:joined");
        assert_eq!(value["data"]["id"], "77");
        assert_eq!(value["data"]["carId"], "falcon");
        assert_eq!(value["data"]["position"]["y"], 0.5);
    }

    #[test]
    fn player_left_carries_bare_identity() {
        let msg = ServerMessage::from(&RelayBroadcast::PlayerLeft(PlayerId(5)));
        let value = serde_json::to_value(msg).expect("serializes");
        assert_eq!(value, json!({"type": "player:left", "data": "5"}));
    }

    #[test]
    fn init_round_trips_into_client_view() {
        let snapshot = InitSnapshot {
            id: PlayerId(3),
            players: vec![PlayerSession::spawn(
                PlayerId(1),
                JoinRequest::default(),
                "falcon",
            )],
            cars: Arc::new(CarCatalog::builtin()),
        };
        let text = serde_json::to_string(&ServerMessage::Init((&snapshot).into()))
            .expect("serializes");
        assert!(text.contains("\"maxSpeed\":55.0"));

        let ServerMessage::Init(dto) = serde_json::from_str::<ServerMessage>(&text).expect("parses") else {
            panic!("expected init");
        };
        let view = InitView::try_from(dto).expect("valid init");
        assert_eq!(view.id, PlayerId(3));
        assert_eq!(view.players[0].id, PlayerId(1));
        assert_eq!(view.catalog, CarCatalog::builtin());
    }

    #[test]
    fn malformed_ids_are_rejected_on_the_client_side() {
        let mut dto = PlayerSessionDto::from(&PlayerSession::spawn(
            PlayerId(1),
            JoinRequest::default(),
            "falcon",
        ));
        dto.id = "socket-abc".to_string();
        assert!(matches!(
            PlayerSession::try_from(dto),
            Err(ProtocolError::BadPlayerId(_))
        ));
    }
}
