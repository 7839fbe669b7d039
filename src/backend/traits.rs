//! RecordStore trait definition
//!
//! Defines the abstract interface over the hosted relational backend.
//! Every department table, discussion table and profile table is reached
//! through these five operations, which keeps the managers testable with
//! the in-memory mock.

use super::query::SelectQuery;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// A single table row as returned by the backend
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Abstract interface for all backend table operations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Select rows from a table
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Vec<Row>>;

    /// Insert a row and return its stored representation
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Patch the row with the given id. Returns `None` if no row matched.
    async fn update(&self, table: &str, id: Uuid, patch: Row) -> Result<Option<Row>>;

    /// Delete the row with the given id. Returns whether a row was removed.
    async fn delete(&self, table: &str, id: Uuid) -> Result<bool>;

    /// Check connectivity to the backend
    async fn health_check(&self) -> Result<bool>;
}

/// Read a string column. Non-string scalars are rendered with their JSON form.
pub fn row_str(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Read a UUID column
pub fn row_uuid(row: &Row, column: &str) -> Option<Uuid> {
    row.get(column)?.as_str()?.parse().ok()
}

/// Read a date column. Accepts plain dates and RFC 3339 timestamps.
pub fn row_date(row: &Row, column: &str) -> Option<NaiveDate> {
    let raw = row.get(column)?.as_str()?;
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
