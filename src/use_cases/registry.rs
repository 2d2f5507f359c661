// Session registry owned by the relay task.

use crate::domain::{CarCatalog, JoinRequest, MotionReport, PlayerId, PlayerSession};
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping from connection identity to joined player.
///
/// Only the relay task mutates it, so it needs no locking.
#[derive(Debug)]
pub struct SessionRegistry {
    /// Catalog used to pick the default car for joins without one.
    catalog: Arc<CarCatalog>,
    /// Active sessions keyed by the owning connection's identity.
    sessions: HashMap<PlayerId, PlayerSession>,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<CarCatalog>) -> Self {
        Self {
            catalog,
            sessions: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<CarCatalog> {
        &self.catalog
    }

    /// Creates (or replaces) the session for `player_id` at the spawn point.
    pub fn join(&mut self, player_id: PlayerId, request: JoinRequest) -> &PlayerSession {
        let session = PlayerSession::spawn(player_id, request, &self.catalog.default_car().id);
        self.sessions.insert(player_id, session);
        &self.sessions[&player_id]
    }

    /// Updates motion fields in place. Returns `None` when the sender never joined.
    pub fn apply_state(
        &mut self,
        player_id: PlayerId,
        report: MotionReport,
    ) -> Option<&PlayerSession> {
        let session = self.sessions.get_mut(&player_id)?;
        session.apply_motion(report);
        Some(&*session)
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<PlayerSession> {
        self.sessions.remove(&player_id)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&PlayerSession> {
        self.sessions.get(&player_id)
    }

    /// Copies every session, ordered by id for stable output.
    pub fn snapshot(&self) -> Vec<PlayerSession> {
        let mut players: Vec<PlayerSession> = self.sessions.values().cloned().collect();
        players.sort_by_key(|p| p.id);
        players
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
