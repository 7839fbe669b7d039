//! Dashboard calendar and per-category summary
//!
//! Uses the same partial join as the team schedule: each department table is
//! fetched on its own and a failing table only drops its own entries.

use super::models::*;
use crate::backend::RecordStore;
use crate::departments::manager::{parse_records, range_query};
use crate::departments::{Department, DepartmentRecord, RecordFilter, TableSpec, CATALOG};
use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

pub struct DashboardService {
    store: Arc<dyn RecordStore>,
}

/// Records fetched per table, plus the scopes that failed
struct RangeFetch {
    tables: Vec<(&'static TableSpec, Vec<DepartmentRecord>)>,
    failed_sources: Vec<String>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn fetch_table(
        &self,
        spec: &'static TableSpec,
        range: DateRange,
    ) -> Result<Vec<DepartmentRecord>> {
        let filter = RecordFilter {
            from: Some(range.from),
            to: Some(range.to),
            search: None,
        };
        let rows = self.store.select(spec.table, &range_query(&filter)).await?;
        Ok(parse_records(spec, rows))
    }

    async fn fetch_range(&self, range: DateRange, department: Option<Department>) -> RangeFetch {
        let specs: Vec<&'static TableSpec> = CATALOG
            .iter()
            .filter(|spec| department.is_none_or(|d| spec.department == d))
            .collect();
        let results = join_all(specs.iter().map(|spec| self.fetch_table(spec, range))).await;

        let mut fetch = RangeFetch {
            tables: Vec::new(),
            failed_sources: Vec::new(),
        };
        for (spec, result) in specs.into_iter().zip(results) {
            match result {
                Ok(records) => fetch.tables.push((spec, records)),
                Err(e) => {
                    warn!(source = %spec.scope(), "Dashboard source failed: {}", e);
                    fetch.failed_sources.push(spec.scope());
                }
            }
        }
        fetch
    }

    /// Every department record in range, grouped by day
    pub async fn calendar(&self, range: DateRange, department: Option<Department>) -> CalendarView {
        let fetch = self.fetch_range(range, department).await;

        let mut days: BTreeMap<_, Vec<CalendarEntry>> = BTreeMap::new();
        for (spec, records) in fetch.tables {
            for record in records {
                days.entry(record.date).or_default().push(CalendarEntry {
                    department: spec.department,
                    category: spec.key,
                    record_id: record.id,
                    title: record.title(spec),
                    start_time: row_time(&record.fields, "start_time"),
                });
            }
        }
        for entries in days.values_mut() {
            entries.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        }

        CalendarView {
            from: range.from,
            to: range.to,
            days,
            failed_sources: fetch.failed_sources,
        }
    }

    /// Record counts per department category
    pub async fn summary(&self, range: DateRange) -> DashboardSummary {
        let fetch = self.fetch_range(range, None).await;
        let categories: Vec<CategoryCount> = fetch
            .tables
            .iter()
            .map(|(spec, records)| CategoryCount {
                department: spec.department,
                category: spec.key,
                label: spec.label,
                count: records.len(),
            })
            .collect();

        DashboardSummary {
            from: range.from,
            to: range.to,
            total: categories.iter().map(|c| c.count).sum(),
            categories,
            failed_sources: fetch.failed_sources,
        }
    }
}
