//! Schedule and calendar view models

use crate::backend::{row_str, Row};
use crate::departments::Department;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Inclusive date range, validated so that `from <= to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, String> {
        if from > to {
            return Err(format!("from ({}) must not be after to ({})", from, to));
        }
        Ok(Self { from, to })
    }
}

/// Where a schedule item came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSource {
    Personal,
    Department {
        department: Department,
        category: &'static str,
    },
}

impl ScheduleSource {
    /// `personal` or `department/category`
    pub fn label(&self) -> String {
        match self {
            ScheduleSource::Personal => "personal".to_string(),
            ScheduleSource::Department {
                department,
                category,
            } => format!("{}/{}", department.slug(), category),
        }
    }
}

/// One entry of a user's merged schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleItem {
    pub source: ScheduleSource,
    pub record_id: Uuid,
    pub date: NaiveDate,
    pub title: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// A user's personal entries merged with the department records naming them
#[derive(Debug, Clone, Serialize)]
pub struct TeamSchedule {
    pub user_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// True when nothing is scheduled in the range
    pub available: bool,
    pub items: Vec<ScheduleItem>,
    /// Sources that could not be fetched and are missing from `items`
    pub failed_sources: Vec<String>,
}

/// Department record shown on the dashboard calendar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry {
    pub department: Department,
    pub category: &'static str,
    pub record_id: Uuid,
    pub title: String,
    pub start_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: BTreeMap<NaiveDate, Vec<CalendarEntry>>,
    pub failed_sources: Vec<String>,
}

/// Record count for one department category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub department: Department,
    pub category: &'static str,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total: usize,
    pub categories: Vec<CategoryCount>,
    pub failed_sources: Vec<String>,
}

/// Read a time-of-day column (`HH:MM:SS` or `HH:MM`)
pub fn row_time(row: &Row, column: &str) -> Option<NaiveTime> {
    let raw = row_str(row, column)?;
    NaiveTime::parse_from_str(&raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .ok()
}
