//! Discussion thread operations

use super::models::*;
use crate::backend::{RecordStore, Row, SelectQuery, SortDirection};
use crate::departments::TableSpec;
use crate::events::{CrudAction, CrudEvent, EntityType, EventEmitter};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Manager for per-category discussion threads
pub struct DiscussionManager {
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventEmitter>,
}

fn parse_messages(table: &str, rows: Vec<Row>) -> Vec<DiscussionMessage> {
    rows.into_iter()
        .filter_map(|row| {
            match serde_json::from_value::<DiscussionMessage>(serde_json::Value::Object(row)) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    warn!(table = %table, "Skipping malformed message: {}", e);
                    None
                }
            }
        })
        .collect()
}

impl DiscussionManager {
    pub fn new(store: Arc<dyn RecordStore>, events: Arc<dyn EventEmitter>) -> Self {
        Self { store, events }
    }

    /// Messages on a record, oldest first
    pub async fn list_messages(
        &self,
        spec: &TableSpec,
        record_id: Uuid,
    ) -> Result<Vec<DiscussionMessage>> {
        let query = SelectQuery::new()
            .eq("record_id", record_id)
            .order_by("created_at", SortDirection::Asc);
        let rows = self.store.select(spec.discussion_table, &query).await?;
        Ok(parse_messages(spec.discussion_table, rows))
    }

    /// Post a message and push it to thread subscribers
    pub async fn post_message(
        &self,
        spec: &TableSpec,
        record_id: Uuid,
        author: &Author,
        req: PostMessageRequest,
    ) -> Result<DiscussionMessage> {
        let message = DiscussionMessage {
            id: Uuid::new_v4(),
            record_id,
            author_id: author.id,
            author_name: author.name.clone(),
            message: req.message.trim().to_string(),
            created_at: Utc::now(),
        };

        let row = match serde_json::to_value(&message)? {
            serde_json::Value::Object(row) => row,
            _ => Row::new(),
        };
        let stored = self.store.insert(spec.discussion_table, row).await?;
        let message: DiscussionMessage = serde_json::from_value(serde_json::Value::Object(stored))?;

        debug!(table = %spec.discussion_table, record_id = %record_id, "Message posted");
        self.events.emit(
            CrudEvent::new(
                EntityType::DiscussionMessage,
                CrudAction::Created,
                message.id.to_string(),
            )
            .with_related(EntityType::Record, record_id.to_string())
            .with_payload(serde_json::to_value(&message)?)
            .with_scope(spec.scope()),
        );
        Ok(message)
    }

    /// Delete a message. Only its author or an administrator may do so.
    pub async fn delete_message(
        &self,
        spec: &TableSpec,
        message_id: Uuid,
        requester: &Author,
    ) -> Result<DeleteOutcome> {
        let rows = self
            .store
            .select(
                spec.discussion_table,
                &SelectQuery::new().eq("id", message_id).limit(1),
            )
            .await?;
        let Some(message) = parse_messages(spec.discussion_table, rows).into_iter().next() else {
            return Ok(DeleteOutcome::NotFound);
        };

        if message.author_id != requester.id && !requester.is_admin {
            return Ok(DeleteOutcome::Forbidden);
        }

        if !self.store.delete(spec.discussion_table, message_id).await? {
            return Ok(DeleteOutcome::NotFound);
        }
        self.events.emit(
            CrudEvent::new(
                EntityType::DiscussionMessage,
                CrudAction::Deleted,
                message_id.to_string(),
            )
            .with_related(EntityType::Record, message.record_id.to_string())
            .with_scope(spec.scope()),
        );
        Ok(DeleteOutcome::Deleted)
    }
}
