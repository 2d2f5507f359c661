// Single-writer relay: applies connection events to the registry and fans out the result.

use super::registry::SessionRegistry;
use super::types::{Attachment, ChatLine, InitSnapshot, RelayBroadcast, RelayEvent};
use crate::domain::Clock;
use crate::domain::PlayerId;
use crate::domain::session::ANONYMOUS_CHAT_NAME;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

pub struct Relay<C> {
    registry: SessionRegistry,
    clock: C,
    outbound_tx: broadcast::Sender<RelayBroadcast>,
}

impl<C: Clock> Relay<C> {
    pub fn new(
        registry: SessionRegistry,
        clock: C,
        outbound_tx: broadcast::Sender<RelayBroadcast>,
    ) -> Self {
        Self {
            registry,
            clock,
            outbound_tx,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handles one event to completion, including its fan-out.
    pub fn handle(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connect { player_id, reply } => {
                info!(%player_id, players = self.registry.len(), "connection attached");
                // A dropped reply means the socket died during bootstrap.
                let _ = reply.send(self.attach(player_id));
            }
            RelayEvent::Resync { player_id, reply } => {
                debug!(%player_id, "resync requested");
                let _ = reply.send(self.attach(player_id));
            }
            RelayEvent::Join { player_id, request } => {
                let session = self.registry.join(player_id, request).clone();
                info!(
                    %player_id,
                    name = %session.name,
                    car_id = %session.car_id,
                    "player joined"
                );
                self.broadcast(RelayBroadcast::PlayerJoined(session));
            }
            RelayEvent::StateUpdate { player_id, report } => {
                // Reports from connections that never joined are dropped silently.
                if let Some(session) = self.registry.apply_state(player_id, report) {
                    let session = session.clone();
                    self.broadcast(RelayBroadcast::StateSync(session));
                }
            }
            RelayEvent::Chat { player_id, text } => {
                let name = self
                    .registry
                    .get(player_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| ANONYMOUS_CHAT_NAME.to_string());
                let line = ChatLine {
                    id: player_id,
                    name,
                    text,
                    timestamp: self.clock.now_epoch_millis(),
                };
                self.broadcast(RelayBroadcast::Chat(line));
            }
            RelayEvent::Disconnect { player_id } => {
                let had_session = self.registry.remove(player_id).is_some();
                info!(%player_id, had_session, "player left");
                self.broadcast(RelayBroadcast::PlayerLeft(player_id));
            }
        }
    }

    fn attach(&self, player_id: PlayerId) -> Attachment {
        // Subscribe while holding the event order so the snapshot and the stream line up.
        let updates = self.outbound_tx.subscribe();
        Attachment {
            init: InitSnapshot {
                id: player_id,
                players: self.registry.snapshot(),
                cars: self.registry.catalog().clone(),
            },
            updates,
        }
    }

    fn broadcast(&self, msg: RelayBroadcast) {
        // Err only means nobody is subscribed right now.
        let receivers = self.outbound_tx.send(msg).unwrap_or(0);
        debug!(receivers, "broadcast sent");
    }
}

/// Drains relay events one at a time until every sender is gone.
pub async fn relay_task<C: Clock>(mut events_rx: mpsc::Receiver<RelayEvent>, mut relay: Relay<C>) {
    while let Some(event) = events_rx.recv().await {
        relay.handle(event);
    }
    info!("relay event channel closed; relay exiting");
}
