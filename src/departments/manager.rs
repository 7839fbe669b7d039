//! Department record operations

use super::catalog::TableSpec;
use super::models::*;
use crate::backend::{RecordStore, Row, SelectQuery, SortDirection};
use crate::events::{EntityType, EventEmitter};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Manager for department schedule records
pub struct DepartmentManager {
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventEmitter>,
}

/// Parse backend rows, skipping (and logging) rows that do not fit the record shape
pub(crate) fn parse_records(spec: &TableSpec, rows: Vec<Row>) -> Vec<DepartmentRecord> {
    rows.into_iter()
        .filter_map(|row| match DepartmentRecord::from_row(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(table = %spec.table, "Skipping malformed row: {}", e);
                None
            }
        })
        .collect()
}

/// Select query for a table's rows within an inclusive date range
pub(crate) fn range_query(filter: &RecordFilter) -> SelectQuery {
    SelectQuery::new().between("date", filter.from, filter.to)
}

impl DepartmentManager {
    pub fn new(store: Arc<dyn RecordStore>, events: Arc<dyn EventEmitter>) -> Self {
        Self { store, events }
    }

    /// List records in a category, filtered by date range and title search
    pub async fn list_records(
        &self,
        spec: &TableSpec,
        filter: &RecordFilter,
        direction: SortDirection,
    ) -> Result<Vec<DepartmentRecord>> {
        let mut query = range_query(filter).order_by("date", direction);
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.ilike(spec.title_column, search);
        }
        let rows = self.store.select(spec.table, &query).await?;
        Ok(parse_records(spec, rows))
    }

    pub async fn get_record(&self, spec: &TableSpec, id: Uuid) -> Result<Option<DepartmentRecord>> {
        let rows = self
            .store
            .select(spec.table, &SelectQuery::new().eq("id", id).limit(1))
            .await?;
        Ok(parse_records(spec, rows).into_iter().next())
    }

    pub async fn create_record(
        &self,
        spec: &TableSpec,
        req: CreateRecordRequest,
        created_by: Uuid,
    ) -> Result<DepartmentRecord> {
        let record = req.into_record(created_by);
        let stored = self.store.insert(spec.table, record.to_row()).await?;
        let record = DepartmentRecord::from_row(stored)?;

        info!(table = %spec.table, id = %record.id, "Record created");
        self.events.emit_created(
            EntityType::Record,
            &record.id.to_string(),
            serde_json::to_value(&record)?,
            Some(spec.scope()),
        );
        Ok(record)
    }

    pub async fn update_record(
        &self,
        spec: &TableSpec,
        id: Uuid,
        req: UpdateRecordRequest,
    ) -> Result<Option<DepartmentRecord>> {
        let patch = req.into_patch();
        let payload = serde_json::Value::Object(patch.clone());
        let Some(stored) = self.store.update(spec.table, id, patch).await? else {
            return Ok(None);
        };
        let record = DepartmentRecord::from_row(stored)?;

        self.events.emit_updated(
            EntityType::Record,
            &id.to_string(),
            payload,
            Some(spec.scope()),
        );
        Ok(Some(record))
    }

    /// Delete a record and its discussion thread.
    ///
    /// A failure while clearing the thread is logged; the record stays deleted.
    pub async fn delete_record(&self, spec: &TableSpec, id: Uuid) -> Result<bool> {
        if !self.store.delete(spec.table, id).await? {
            return Ok(false);
        }
        info!(table = %spec.table, id = %id, "Record deleted");
        self.events
            .emit_deleted(EntityType::Record, &id.to_string(), Some(spec.scope()));

        if let Err(e) = self.delete_thread(spec, id).await {
            warn!(table = %spec.discussion_table, record_id = %id, "Failed to clear discussion thread: {}", e);
        }
        Ok(true)
    }

    async fn delete_thread(&self, spec: &TableSpec, record_id: Uuid) -> Result<()> {
        let rows = self
            .store
            .select(
                spec.discussion_table,
                &SelectQuery::new().eq("record_id", record_id),
            )
            .await?;
        for id in rows.iter().filter_map(|r| crate::backend::row_uuid(r, "id")) {
            self.store.delete(spec.discussion_table, id).await?;
        }
        Ok(())
    }
}
