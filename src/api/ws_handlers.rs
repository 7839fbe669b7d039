//! WebSocket handlers for real-time CRUD event notifications
//!
//! - `/ws/events` — every event, optionally filtered
//! - `/ws/discussions` — one record's discussion thread

use super::handlers::{resolve_table, DashboardState};
use super::ws_auth::{send_auth_ok, ws_authenticate};
use crate::auth::Claims;
use crate::events::{CrudEvent, EntityType};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};
use uuid::Uuid;

/// Query parameters for `/ws/events`
#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    /// Comma-separated entity types (e.g. "record,discussion_message")
    pub entity_types: Option<String>,
    /// Department slug
    pub department: Option<String>,
    /// Only events on this record (its own changes and its discussion thread)
    pub record_id: Option<String>,
    /// Session token; browsers cannot send an Authorization header here
    pub token: Option<String>,
}

/// Query parameters for `/ws/discussions`
#[derive(Debug, Deserialize)]
pub struct WsDiscussionQuery {
    pub department: String,
    pub category: String,
    pub record_id: Uuid,
    pub token: Option<String>,
}

/// Filters applied to every event before it is forwarded
#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub entity_types: Option<HashSet<String>>,
    pub department: Option<String>,
    /// Exact `department/category` scope
    pub scope: Option<String>,
    pub record_id: Option<String>,
}

impl EventFilter {
    pub fn from_query(query: &WsQuery) -> Self {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
        };
        Self {
            entity_types: query.entity_types.as_ref().map(|types| {
                types
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            department: non_empty(&query.department),
            scope: None,
            record_id: non_empty(&query.record_id),
        }
    }

    /// New and deleted messages of one thread
    pub fn discussion_thread(scope: String, record_id: Uuid) -> Self {
        Self {
            entity_types: Some(HashSet::from([EntityType::DiscussionMessage.as_str().to_string()])),
            department: None,
            scope: Some(scope),
            record_id: Some(record_id.to_string()),
        }
    }

    pub fn passes(&self, event: &CrudEvent) -> bool {
        if let Some(ref types) = self.entity_types {
            if !types.contains(event.entity_type.as_str()) {
                return false;
            }
        }

        if let Some(ref dept) = self.department {
            match event.department() {
                Some(d) if d == dept => {}
                Some(_) => return false,
                // Unscoped events (profiles, users) pass through
                None => {}
            }
        }

        if let Some(ref scope) = self.scope {
            if event.scope.as_deref() != Some(scope.as_str()) {
                return false;
            }
        }

        if let Some(ref record_id) = self.record_id {
            let own = event.entity_id.eq_ignore_ascii_case(record_id);
            let child = event
                .related
                .as_ref()
                .is_some_and(|r| r.entity_id.eq_ignore_ascii_case(record_id));
            if !own && !child {
                return false;
            }
        }

        true
    }
}

/// WebSocket upgrade handler for `/ws/events`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<DashboardState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
) -> Response {
    let claims = match ws_authenticate(&headers, query.token.as_deref(), &state.auth_config) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("WS events: auth failed");
            return e.into_response();
        }
    };
    let filter = EventFilter::from_query(&query);

    ws.on_upgrade(move |socket| handle_ws(socket, state, claims, filter))
}

/// WebSocket upgrade handler for `/ws/discussions`
pub async fn ws_discussions(
    ws: WebSocketUpgrade,
    State(state): State<DashboardState>,
    headers: HeaderMap,
    Query(query): Query<WsDiscussionQuery>,
) -> Response {
    let claims = match ws_authenticate(&headers, query.token.as_deref(), &state.auth_config) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("WS discussions: auth failed");
            return e.into_response();
        }
    };
    let spec = match resolve_table(&query.department, &query.category) {
        Ok(spec) => spec,
        Err(e) => return e.into_response(),
    };
    let filter = EventFilter::discussion_thread(spec.scope(), query.record_id);

    ws.on_upgrade(move |socket| handle_ws(socket, state, claims, filter))
}

/// Handle an individual WebSocket connection
async fn handle_ws(mut socket: WebSocket, state: DashboardState, claims: Claims, filter: EventFilter) {
    send_auth_ok(&mut socket, &claims).await;

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut event_rx = state.event_bus.subscribe();

    let mut ping_interval = interval(Duration::from_secs(30));
    // Skip the first immediate tick
    ping_interval.tick().await;

    debug!(
        email = %claims.email,
        filter = ?filter,
        "WebSocket events client connected"
    );

    loop {
        tokio::select! {
            result = event_rx.recv() => {
                match result {
                    Ok(event) => {
                        if !filter.passes(&event) {
                            continue;
                        }
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    debug!("WebSocket send failed, client disconnected");
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Failed to serialize CrudEvent: {}", e);
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "WebSocket client lagged, skipping events");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event bus closed, shutting down WebSocket");
                        break;
                    }
                }
            }

            _ = ping_interval.tick() => {
                if ws_sender.send(Message::Ping(vec![].into())).await.is_err() {
                    debug!("Ping failed, client disconnected");
                    break;
                }
            }

            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    // Pongs and client text are ignored
                    _ => {}
                }
            }
        }
    }

    debug!("WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CrudAction;

    fn query(entity_types: Option<&str>, department: Option<&str>, record_id: Option<&str>) -> WsQuery {
        WsQuery {
            entity_types: entity_types.map(String::from),
            department: department.map(String::from),
            record_id: record_id.map(String::from),
            token: None,
        }
    }

    fn message_event(record_id: &str, scope: &str) -> CrudEvent {
        CrudEvent::new(EntityType::DiscussionMessage, CrudAction::Created, "m-1")
            .with_related(EntityType::Record, record_id)
            .with_scope(scope)
    }

    #[test]
    fn test_no_filter_passes_everything() {
        let filter = EventFilter::from_query(&WsQuery::default());
        assert!(filter.passes(&message_event("r-1", "bdm/meetings")));
        assert!(filter.passes(&CrudEvent::new(EntityType::User, CrudAction::Deleted, "u-1")));
    }

    #[test]
    fn test_entity_type_filter() {
        let filter = EventFilter::from_query(&query(Some("record, Personal_Entry"), None, None));
        assert!(!filter.passes(&message_event("r-1", "bdm/meetings")));
        assert!(filter.passes(&CrudEvent::new(EntityType::Record, CrudAction::Updated, "r-1")));
        assert!(filter.passes(&CrudEvent::new(EntityType::PersonalEntry, CrudAction::Created, "p-1")));
    }

    #[test]
    fn test_department_filter_lets_unscoped_events_through() {
        let filter = EventFilter::from_query(&query(None, Some("HiTech"), None));
        assert!(filter.passes(&message_event("r-1", "hitech/events")));
        assert!(!filter.passes(&message_event("r-1", "cluster6/reports")));
        assert!(filter.passes(&CrudEvent::new(EntityType::Profile, CrudAction::Updated, "u-1")));
    }

    #[test]
    fn test_record_filter_matches_record_and_thread() {
        let filter = EventFilter::from_query(&query(None, None, Some("r-1")));
        assert!(filter.passes(&message_event("r-1", "bdm/meetings")));
        assert!(!filter.passes(&message_event("r-2", "bdm/meetings")));
        assert!(filter.passes(&CrudEvent::new(EntityType::Record, CrudAction::Deleted, "r-1")));
    }

    #[test]
    fn test_discussion_thread_filter() {
        let record = Uuid::new_v4();
        let filter = EventFilter::discussion_thread("bdm/meetings".to_string(), record);
        let id = record.to_string();

        assert!(filter.passes(&message_event(&id, "bdm/meetings")));
        // Same record id under another table is a different thread
        assert!(!filter.passes(&message_event(&id, "bdm/trainings")));
        // Edits to the record itself are not thread traffic
        let record_event = CrudEvent::new(EntityType::Record, CrudAction::Updated, id.clone())
            .with_scope("bdm/meetings");
        assert!(!filter.passes(&record_event));
    }
}
