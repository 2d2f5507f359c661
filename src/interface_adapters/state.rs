use crate::use_cases::RelayEvent;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Connection events flowing into the single relay task.
    pub events_tx: mpsc::Sender<RelayEvent>,
}
