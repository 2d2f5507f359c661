// Display cache of the last reported pose of every remote player.

use crate::domain::session::{PlayerId, PlayerSession, Rotation, Vec3};
use std::collections::HashMap;

/// Last received pose for one remote car. Last write wins; no smoothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub position: Vec3,
    pub rotation: Rotation,
    pub color: String,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteStateCache {
    local_id: Option<PlayerId>,
    entries: HashMap<PlayerId, RemoteSnapshot>,
}

impl RemoteStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identity whose echoes must be ignored.
    pub fn set_local_id(&mut self, id: PlayerId) {
        self.local_id = Some(id);
        self.entries.remove(&id);
    }

    pub fn local_id(&self) -> Option<PlayerId> {
        self.local_id
    }

    fn is_local(&self, id: PlayerId) -> bool {
        self.local_id == Some(id)
    }

    /// Populates entries from the initial roster, keeping any entry already present.
    pub fn on_init<'a>(&mut self, players: impl IntoIterator<Item = &'a PlayerSession>) {
        for player in players {
            self.on_join(player);
        }
    }

    pub fn on_join(&mut self, player: &PlayerSession) {
        if self.is_local(player.id) {
            return;
        }
        self.entries
            .entry(player.id)
            .or_insert_with(|| RemoteSnapshot {
                position: player.position,
                rotation: player.rotation,
                color: player.color.clone(),
            });
    }

    /// Overwrites the pose for `id`. Ids not announced by `init` or a join are ignored.
    pub fn on_sync(&mut self, id: PlayerId, position: Vec3, rotation: Rotation) {
        if self.is_local(id) {
            return;
        }
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.position = position;
            entry.rotation = rotation;
        }
    }

    pub fn on_leave(&mut self, id: PlayerId) -> Option<RemoteSnapshot> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&RemoteSnapshot> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
