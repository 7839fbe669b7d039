//! In-process fan-out of dashboard changes to `/ws/events` and
//! `/ws/discussions` connections

use super::{CrudEvent, EventEmitter};
use tokio::sync::broadcast;
use tracing::debug;

/// Events a slow WebSocket client may fall behind before it sees `Lagged`
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast channel shared by every manager and WebSocket connection.
///
/// Managers emit after a successful backend write; with no connected
/// dashboard the send fails and the event is dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CrudEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// One receiver per WebSocket connection
    pub fn subscribe(&self) -> broadcast::Receiver<CrudEvent> {
        self.sender.subscribe()
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: CrudEvent) {
        let summary = format!(
            "{}:{:?} {}",
            event.entity_type.as_str(),
            event.action,
            event.scope.as_deref().unwrap_or("-")
        );
        match self.sender.send(event) {
            Ok(clients) => debug!(event = %summary, clients, "Dashboard event broadcast"),
            Err(_) => debug!(event = %summary, "No dashboard clients, event dropped"),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
