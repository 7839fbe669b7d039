//! Team schedule and dashboard handlers

use crate::api::handlers::{AppError, DashboardState};
use crate::auth::AuthUser;
use crate::departments::Department;
use crate::schedule::{CalendarView, DashboardSummary, DateRange, TeamSchedule};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct TeamScheduleQuery {
    /// Defaults to the caller
    pub user_id: Option<Uuid>,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn date_range(from: NaiveDate, to: NaiveDate) -> Result<DateRange, AppError> {
    DateRange::new(from, to).map_err(AppError::BadRequest)
}

/// GET /api/schedule/team?user_id=&from=&to=
///
/// Never fails because one source table is unavailable; missing sources are
/// listed in `failed_sources`.
pub async fn team_schedule(
    State(state): State<DashboardState>,
    user: AuthUser,
    Query(query): Query<TeamScheduleQuery>,
) -> Result<Json<TeamSchedule>, AppError> {
    let range = date_range(query.from, query.to)?;
    let user_id = query.user_id.unwrap_or(user.user_id);
    Ok(Json(state.team.for_user(user_id, range).await))
}

/// GET /api/dashboard/calendar?from=&to=&department=
pub async fn calendar(
    State(state): State<DashboardState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarView>, AppError> {
    let range = date_range(query.from, query.to)?;
    let department = query
        .department
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(str::parse::<Department>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    Ok(Json(state.dashboard.calendar(range, department).await))
}

/// GET /api/dashboard/summary?from=&to=
pub async fn summary(
    State(state): State<DashboardState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let range = date_range(query.from, query.to)?;
    Ok(Json(state.dashboard.summary(range).await))
}
