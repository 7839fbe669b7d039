//! Personal calendar operations, always scoped to the owning user

use super::models::*;
use crate::backend::{RecordStore, Row, SelectQuery, SortDirection};
use crate::events::{EntityType, EventEmitter};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Backend table holding personal calendar entries
pub const PERSONAL_TABLE: &str = "personal_schedules";

const SCOPE: &str = "personal";

/// Result of updating an entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryUpdate {
    Updated(PersonalEntry),
    NotFound,
    /// The merged entry failed validation
    Invalid(String),
}

/// Manager for personal calendar entries
pub struct PersonalScheduleManager {
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventEmitter>,
}

pub(crate) fn parse_entries(rows: Vec<Row>) -> Vec<PersonalEntry> {
    rows.into_iter()
        .filter_map(|row| {
            match serde_json::from_value::<PersonalEntry>(serde_json::Value::Object(row)) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(table = PERSONAL_TABLE, "Skipping malformed entry: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn entry_row(entry: &PersonalEntry) -> Result<Row> {
    match serde_json::to_value(entry)? {
        serde_json::Value::Object(row) => Ok(row),
        _ => Ok(Row::new()),
    }
}

/// Query for one user's entries in an inclusive date range
pub(crate) fn owner_range_query(
    user_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> SelectQuery {
    SelectQuery::new()
        .eq("user_id", user_id)
        .between("date", from, to)
        .order_by("date", SortDirection::Asc)
}

impl PersonalScheduleManager {
    pub fn new(store: Arc<dyn RecordStore>, events: Arc<dyn EventEmitter>) -> Self {
        Self { store, events }
    }

    pub async fn list_entries(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PersonalEntry>> {
        let rows = self
            .store
            .select(PERSONAL_TABLE, &owner_range_query(user_id, from, to))
            .await?;
        Ok(parse_entries(rows))
    }

    async fn get_owned(&self, user_id: Uuid, id: Uuid) -> Result<Option<PersonalEntry>> {
        let rows = self
            .store
            .select(
                PERSONAL_TABLE,
                &SelectQuery::new().eq("id", id).eq("user_id", user_id).limit(1),
            )
            .await?;
        Ok(parse_entries(rows).into_iter().next())
    }

    pub async fn create_entry(
        &self,
        user_id: Uuid,
        req: CreatePersonalEntryRequest,
    ) -> Result<PersonalEntry> {
        let entry = PersonalEntry {
            id: Uuid::new_v4(),
            user_id,
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            title: req.title.trim().to_string(),
            notes: req.notes,
            created_at: Some(Utc::now()),
        };
        self.store.insert(PERSONAL_TABLE, entry_row(&entry)?).await?;
        self.events.emit_created(
            EntityType::PersonalEntry,
            &entry.id.to_string(),
            serde_json::to_value(&entry)?,
            Some(SCOPE.to_string()),
        );
        Ok(entry)
    }

    pub async fn update_entry(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: UpdatePersonalEntryRequest,
    ) -> Result<EntryUpdate> {
        let Some(mut entry) = self.get_owned(user_id, id).await? else {
            return Ok(EntryUpdate::NotFound);
        };
        req.apply(&mut entry);
        if let Err(msg) = entry.validate_times() {
            return Ok(EntryUpdate::Invalid(msg));
        }

        if self
            .store
            .update(PERSONAL_TABLE, id, entry_row(&entry)?)
            .await?
            .is_none()
        {
            return Ok(EntryUpdate::NotFound);
        }
        self.events.emit_updated(
            EntityType::PersonalEntry,
            &id.to_string(),
            serde_json::to_value(&entry)?,
            Some(SCOPE.to_string()),
        );
        Ok(EntryUpdate::Updated(entry))
    }

    pub async fn delete_entry(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        if self.get_owned(user_id, id).await?.is_none() {
            return Ok(false);
        }
        let removed = self.store.delete(PERSONAL_TABLE, id).await?;
        if removed {
            self.events.emit_deleted(
                EntityType::PersonalEntry,
                &id.to_string(),
                Some(SCOPE.to_string()),
            );
        }
        Ok(removed)
    }
}
