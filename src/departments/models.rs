//! Department record models

use super::catalog::TableSpec;
use crate::backend::{row_str, Row};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Columns the service owns; clients cannot set them through field maps
pub const RESERVED_COLUMNS: [&str; 4] = ["id", "date", "created_at", "created_by"];

/// A row in a department schedule table.
///
/// Only the columns every table shares are typed; the department-specific
/// columns travel in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: Row,
}

impl DepartmentRecord {
    /// Value of the table's title column, or an empty string
    pub fn title(&self, spec: &TableSpec) -> String {
        row_str(&self.fields, spec.title_column).unwrap_or_default()
    }

    pub fn to_row(&self) -> Row {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(row)) => row,
            _ => Row::new(),
        }
    }

    pub fn from_row(row: Row) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::Value::Object(row))
    }
}

fn strip_reserved(fields: &mut Row) {
    for column in RESERVED_COLUMNS {
        fields.remove(column);
    }
}

/// Request to create a record
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecordRequest {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub fields: Row,
}

impl CreateRecordRequest {
    /// Check that the title column is present and non-blank
    pub fn validate(&self, spec: &TableSpec) -> Result<(), String> {
        match row_str(&self.fields, spec.title_column) {
            Some(title) if !title.trim().is_empty() => Ok(()),
            _ => Err(format!("Field '{}' is required", spec.title_column)),
        }
    }

    pub fn into_record(mut self, created_by: Uuid) -> DepartmentRecord {
        strip_reserved(&mut self.fields);
        DepartmentRecord {
            id: Uuid::new_v4(),
            date: self.date,
            created_by: Some(created_by),
            created_at: Some(Utc::now()),
            fields: self.fields,
        }
    }
}

/// Partial update of a record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecordRequest {
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub fields: Row,
}

impl UpdateRecordRequest {
    /// Blanking the title column is rejected
    pub fn validate(&self, spec: &TableSpec) -> Result<(), String> {
        match self.fields.get(spec.title_column) {
            Some(serde_json::Value::Null) => {
                Err(format!("Field '{}' cannot be cleared", spec.title_column))
            }
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
                Err(format!("Field '{}' cannot be cleared", spec.title_column))
            }
            _ => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.fields.keys().all(|k| RESERVED_COLUMNS.contains(&k.as_str()))
    }

    /// Patch to send to the backend
    pub fn into_patch(mut self) -> Row {
        strip_reserved(&mut self.fields);
        if let Some(date) = self.date {
            self.fields
                .insert("date".to_string(), serde_json::Value::String(date.to_string()));
        }
        self.fields
    }
}

/// Filters for listing records
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Case-insensitive search over the title column
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn validate(&self) -> Result<(), String> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err("'from' must not be after 'to'".to_string())
            }
            _ => Ok(()),
        }
    }
}
