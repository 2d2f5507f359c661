// Use-case level events flowing into the relay and fan-out flowing back out.

use crate::domain::{CarCatalog, JoinRequest, MotionReport, PlayerId, PlayerSession};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};

#[derive(Debug)]
pub enum RelayEvent {
    // A websocket attached; the relay answers with the init snapshot and a subscription.
    Connect {
        player_id: PlayerId,
        reply: oneshot::Sender<Attachment>,
    },
    // The connection fell behind the broadcast buffer and needs a fresh snapshot.
    Resync {
        player_id: PlayerId,
        reply: oneshot::Sender<Attachment>,
    },
    Join {
        player_id: PlayerId,
        request: JoinRequest,
    },
    StateUpdate {
        player_id: PlayerId,
        report: MotionReport,
    },
    Chat {
        player_id: PlayerId,
        text: String,
    },
    Disconnect {
        player_id: PlayerId,
    },
}

/// Unicast payload for a newly attached connection.
#[derive(Debug, Clone)]
pub struct InitSnapshot {
    pub id: PlayerId,
    pub players: Vec<PlayerSession>,
    pub cars: Arc<CarCatalog>,
}

/// Init snapshot plus a broadcast subscription taken at the same point in the event order.
#[derive(Debug)]
pub struct Attachment {
    pub init: InitSnapshot,
    pub updates: broadcast::Receiver<RelayBroadcast>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub id: PlayerId,
    pub name: String,
    pub text: String,
    /// Milliseconds since the Unix epoch, stamped by the relay.
    pub timestamp: u64,
}

/// Messages delivered to every connection, the sender included.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayBroadcast {
    PlayerJoined(PlayerSession),
    StateSync(PlayerSession),
    PlayerLeft(PlayerId),
    Chat(ChatLine),
}
