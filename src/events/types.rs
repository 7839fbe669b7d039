//! CRUD event types for WebSocket notifications

use serde::{Deserialize, Serialize};

/// The type of entity that was mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Record,
    DiscussionMessage,
    PersonalEntry,
    Profile,
    User,
}

impl EntityType {
    /// The snake_case name used on the wire and in WebSocket filters
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Record => "record",
            EntityType::DiscussionMessage => "discussion_message",
            EntityType::PersonalEntry => "personal_entry",
            EntityType::Profile => "profile",
            EntityType::User => "user",
        }
    }
}

/// The CRUD action performed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudAction {
    Created,
    Updated,
    Deleted,
}

/// The parent entity an event belongs to (e.g. the record a message was posted on)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub entity_type: EntityType,
    pub entity_id: String,
}

/// A CRUD event emitted after a successful mutation
///
/// Sent to WebSocket clients for real-time UI updates.
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrudEvent {
    pub entity_type: EntityType,
    pub action: CrudAction,
    pub entity_id: String,
    /// Parent entity, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedEntity>,
    /// Entity data (e.g. the posted message or the changed fields)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// `department/category` scope for client-side filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl CrudEvent {
    /// Create a new CrudEvent with the current timestamp
    pub fn new(entity_type: EntityType, action: CrudAction, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            action,
            entity_id: entity_id.into(),
            related: None,
            payload: serde_json::Value::Null,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
            scope: None,
        }
    }

    pub fn with_related(mut self, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        self.related = Some(RelatedEntity {
            entity_type,
            entity_id: entity_id.into(),
        });
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Department slug, taken from the first segment of the scope
    pub fn department(&self) -> Option<&str> {
        self.scope.as_deref().and_then(|s| s.split('/').next())
    }
}

/// Sink for CRUD events. Emitting never blocks and never fails.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: CrudEvent);

    fn emit_created(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: serde_json::Value,
        scope: Option<String>,
    ) {
        let mut event =
            CrudEvent::new(entity_type, CrudAction::Created, entity_id).with_payload(payload);
        event.scope = scope;
        self.emit(event);
    }

    fn emit_updated(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: serde_json::Value,
        scope: Option<String>,
    ) {
        let mut event =
            CrudEvent::new(entity_type, CrudAction::Updated, entity_id).with_payload(payload);
        event.scope = scope;
        self.emit(event);
    }

    fn emit_deleted(&self, entity_type: EntityType, entity_id: &str, scope: Option<String>) {
        let mut event = CrudEvent::new(entity_type, CrudAction::Deleted, entity_id);
        event.scope = scope;
        self.emit(event);
    }
}
