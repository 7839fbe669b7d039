//! In-memory mock implementation of RecordStore for testing.
//!
//! Tables are `tokio::sync::RwLock<HashMap<String, Vec<Row>>>`. Individual
//! tables can be marked as failing to exercise partial-failure paths.

use super::query::{Filter, SelectQuery, SortDirection};
use super::traits::{row_str, RecordStore, Row};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory mock implementation of RecordStore for testing.
#[derive(Default)]
pub struct MockRecordStore {
    pub tables: RwLock<HashMap<String, Vec<Row>>>,
    pub failing: RwLock<HashSet<String>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows into a table.
    pub async fn with_rows(self, table: &str, rows: Vec<serde_json::Value>) -> Self {
        {
            let mut tables = self.tables.write().await;
            let entry = tables.entry(table.to_string()).or_default();
            for value in rows {
                if let serde_json::Value::Object(row) = value {
                    entry.push(row);
                }
            }
        }
        self
    }

    /// Make every operation on `table` fail.
    pub async fn failing_table(self, table: &str) -> Self {
        self.failing.write().await.insert(table.to_string());
        self
    }

    /// Snapshot of a table's rows.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    async fn guard(&self, table: &str) -> Result<()> {
        if self.failing.read().await.contains(table) {
            return Err(anyhow!("simulated backend failure on {}", table));
        }
        Ok(())
    }
}

fn matches_filter(row: &Row, filter: &Filter) -> bool {
    let Some(actual) = row_str(row, filter.column()) else {
        return false;
    };
    match filter {
        Filter::Eq { value, .. } => &actual == value,
        Filter::Gte { value, .. } => actual.as_str() >= value.as_str(),
        Filter::Lte { value, .. } => actual.as_str() <= value.as_str(),
        // Literal match, as the REST encoding escapes wildcards and drops `*`
        Filter::ILike { needle, .. } => actual
            .to_lowercase()
            .contains(&needle.replace('*', "").to_lowercase()),
    }
}

/// Timestamps compare chronologically, everything else as strings
fn compare_column(a: &Row, b: &Row, column: &str) -> Ordering {
    let (a, b) = (row_str(a, column), row_str(b, column));
    let parsed = |v: &Option<String>| {
        v.as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
    };
    match (parsed(&a), parsed(&b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(&b),
    }
}

fn id_matches(row: &Row, id: Uuid) -> bool {
    row_str(row, "id").is_some_and(|v| v == id.to_string())
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Vec<Row>> {
        self.guard(table).await?;
        let mut rows: Vec<Row> = self
            .rows(table)
            .await
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| matches_filter(row, f)))
            .collect();

        if let Some((column, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_column(a, b, column);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        self.guard(table).await?;
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: Uuid, patch: Row) -> Result<Option<Row>> {
        self.guard(table).await?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(None);
        };
        match rows.iter_mut().find(|row| id_matches(row, id)) {
            Some(row) => {
                for (key, value) in patch {
                    row.insert(key, value);
                }
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<bool> {
        self.guard(table).await?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|row| !id_matches(row, id));
        Ok(rows.len() != before)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_select_applies_filters_and_order() {
        let store = MockRecordStore::new()
            .with_rows(
                "t",
                vec![
                    json!({"id": "1", "date": "2024-01-03", "title": "Beta"}),
                    json!({"id": "2", "date": "2024-01-01", "title": "alpha"}),
                    json!({"id": "3", "date": "2024-02-01", "title": "Gamma"}),
                ],
            )
            .await;

        let q = SelectQuery::new()
            .between("date", Some("2024-01-01"), Some("2024-01-31"))
            .order_by("date", SortDirection::Asc);
        let rows = store.select("t", &q).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| row_str(r, "id").unwrap()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        let rows = store
            .select("t", &SelectQuery::new().ilike("title", "ALPH"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_ilike_treats_wildcards_literally() {
        let store = MockRecordStore::new()
            .with_rows(
                "t",
                vec![
                    json!({"id": "1", "title": "50% off sale"}),
                    json!({"id": "2", "title": "500 off sale"}),
                ],
            )
            .await;

        let rows = store
            .select("t", &SelectQuery::new().ilike("title", "50%"))
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| row_str(r, "id").unwrap()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[tokio::test]
    async fn test_failing_table() {
        let store = MockRecordStore::new().failing_table("broken").await;
        assert!(store.select("broken", &SelectQuery::new()).await.is_err());
        assert!(store.select("fine", &SelectQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id() {
        let id = Uuid::new_v4();
        let store = MockRecordStore::new()
            .with_rows("t", vec![json!({"id": id.to_string(), "title": "old"})])
            .await;

        let mut patch = Row::new();
        patch.insert("title".into(), json!("new"));
        let updated = store.update("t", id, patch).await.unwrap().unwrap();
        assert_eq!(updated["title"], "new");

        assert!(store.update("t", Uuid::new_v4(), Row::new()).await.unwrap().is_none());
        assert!(store.delete("t", id).await.unwrap());
        assert!(!store.delete("t", id).await.unwrap());
    }
}
