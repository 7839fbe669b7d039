//! Team schedule: a user's personal entries merged with the department
//! records that name them.
//!
//! Every source table is fetched independently and concurrently. A source
//! that fails is logged and reported in `failed_sources`; it never fails the
//! whole schedule.

use super::models::*;
use crate::backend::{row_str, RecordStore, SelectQuery};
use crate::departments::manager::{parse_records, range_query};
use crate::departments::{Participant, RecordFilter, ResponsibleField, TableSpec, CATALOG};
use crate::profile::personal::{owner_range_query, parse_entries};
use crate::profile::{PERSONAL_TABLE, PROFILES_TABLE};
use anyhow::Result;
use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

type SourceFetch<'a> = BoxFuture<'a, (String, Result<Vec<ScheduleItem>>)>;

pub struct TeamScheduler {
    store: Arc<dyn RecordStore>,
}

impl TeamScheduler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Build the schedule for a user, resolving their display name first.
    ///
    /// If the profile lookup fails, the name-matched sources cannot be
    /// queried and are reported as failed instead of silently skipped.
    pub async fn for_user(&self, user_id: Uuid, range: DateRange) -> TeamSchedule {
        match self.resolve_participant(user_id).await {
            Ok(participant) => self.collect_sources(&participant, range, false).await,
            Err(e) => {
                warn!(user_id = %user_id, "Profile lookup failed: {}", e);
                self.collect_sources(&Participant::new(user_id, None), range, true)
                    .await
            }
        }
    }

    /// Look up the display name used by the free-text columns
    pub async fn resolve_participant(&self, user_id: Uuid) -> Result<Participant> {
        let query = SelectQuery::new().eq("id", user_id).limit(1);
        let rows = self.store.select(PROFILES_TABLE, &query).await?;
        let name = rows.first().and_then(|row| row_str(row, "name"));
        if name.is_none() {
            debug!(user_id = %user_id, "No profile name, name-based sources skipped");
        }
        Ok(Participant::new(user_id, name))
    }

    pub async fn collect(&self, participant: &Participant, range: DateRange) -> TeamSchedule {
        self.collect_sources(participant, range, false).await
    }

    /// `name_unresolved` marks name-matched sources as failed when they
    /// have to be skipped for lack of a name.
    async fn collect_sources(
        &self,
        participant: &Participant,
        range: DateRange,
        name_unresolved: bool,
    ) -> TeamSchedule {
        let mut failed_sources = Vec::new();
        let mut fetches: Vec<SourceFetch<'_>> = Vec::new();
        fetches.push(
            async move {
                (
                    "personal".to_string(),
                    self.personal_items(participant.id, range).await,
                )
            }
            .boxed(),
        );

        for spec in CATALOG {
            if matches!(spec.responsible, ResponsibleField::Unassigned) {
                continue;
            }
            if spec.responsible.needs_name() && participant.name.is_none() {
                if name_unresolved {
                    failed_sources.push(spec.scope());
                }
                continue;
            }
            fetches.push(
                async move {
                    (
                        spec.scope(),
                        self.department_items(spec, participant, range).await,
                    )
                }
                .boxed(),
            );
        }

        let mut items = Vec::new();
        for (source, result) in join_all(fetches).await {
            match result {
                Ok(mut found) => items.append(&mut found),
                Err(e) => {
                    warn!(source = %source, user_id = %participant.id, "Schedule source failed: {}", e);
                    failed_sources.push(source);
                }
            }
        }
        items.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));

        debug!(
            user_id = %participant.id,
            items = items.len(),
            failed = failed_sources.len(),
            "Team schedule collected"
        );
        TeamSchedule {
            user_id: participant.id,
            from: range.from,
            to: range.to,
            // Empty because sources failed is not the same as free
            available: items.is_empty() && failed_sources.is_empty(),
            items,
            failed_sources,
        }
    }

    async fn personal_items(&self, user_id: Uuid, range: DateRange) -> Result<Vec<ScheduleItem>> {
        let rows = self
            .store
            .select(
                PERSONAL_TABLE,
                &owner_range_query(user_id, Some(range.from), Some(range.to)),
            )
            .await?;
        Ok(parse_entries(rows)
            .into_iter()
            .map(|entry| ScheduleItem {
                source: ScheduleSource::Personal,
                record_id: entry.id,
                date: entry.date,
                title: entry.title,
                start_time: entry.start_time,
                end_time: entry.end_time,
            })
            .collect())
    }

    async fn department_items(
        &self,
        spec: &'static TableSpec,
        participant: &Participant,
        range: DateRange,
    ) -> Result<Vec<ScheduleItem>> {
        let filter = RecordFilter {
            from: Some(range.from),
            to: Some(range.to),
            search: None,
        };
        let rows = self.store.select(spec.table, &range_query(&filter)).await?;
        let matching = rows
            .into_iter()
            .filter(|row| spec.responsible.matches(row, participant))
            .collect();

        Ok(parse_records(spec, matching)
            .into_iter()
            .map(|record| ScheduleItem {
                source: ScheduleSource::Department {
                    department: spec.department,
                    category: spec.key,
                },
                record_id: record.id,
                date: record.date,
                title: record.title(spec),
                start_time: row_time(&record.fields, "start_time"),
                end_time: row_time(&record.fields, "end_time"),
            })
            .collect())
    }
}
