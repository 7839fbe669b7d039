//! Department record handlers
//!
//! Every department category shares the same routes:
//! `/api/departments/{department}/{category}[/{id}]`.

use crate::api::handlers::{resolve_table, AppError, DashboardState};
use crate::api::{DateRangeQuery, PaginatedResponse, PaginationParams};
use crate::auth::AuthUser;
use crate::departments::{
    CreateRecordRequest, Department, DepartmentRecord, RecordFilter, TableSpec, UpdateRecordRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for listing records
#[derive(Debug, Deserialize, Default)]
pub struct RecordsListQuery {
    #[serde(flatten)]
    pub range: DateRangeQuery,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl RecordsListQuery {
    fn to_filter(&self) -> RecordFilter {
        RecordFilter {
            from: self.range.from,
            to: self.range.to,
            search: self.range.search.clone(),
        }
    }
}

/// A department with its categories
#[derive(Debug, Serialize)]
pub struct DepartmentInfo {
    pub department: Department,
    pub label: &'static str,
    pub categories: Vec<&'static TableSpec>,
}

/// GET /api/departments — the table catalog
pub async fn list_departments() -> Json<Vec<DepartmentInfo>> {
    Json(
        Department::ALL
            .iter()
            .map(|d| DepartmentInfo {
                department: *d,
                label: d.label(),
                categories: d.categories().collect(),
            })
            .collect(),
    )
}

pub async fn list_records(
    State(state): State<DashboardState>,
    Path((department, category)): Path<(String, String)>,
    Query(query): Query<RecordsListQuery>,
) -> Result<Json<PaginatedResponse<DepartmentRecord>>, AppError> {
    let spec = resolve_table(&department, &category)?;
    query.pagination.validate().map_err(AppError::BadRequest)?;
    let filter = query.to_filter();
    filter.validate().map_err(AppError::BadRequest)?;

    let records = state
        .departments
        .list_records(spec, &filter, query.pagination.direction())
        .await?;
    Ok(Json(PaginatedResponse::page(records, &query.pagination)))
}

pub async fn get_record(
    State(state): State<DashboardState>,
    Path((department, category, id)): Path<(String, String, Uuid)>,
) -> Result<Json<DepartmentRecord>, AppError> {
    let spec = resolve_table(&department, &category)?;
    let record = state
        .departments
        .get_record(spec, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))?;
    Ok(Json(record))
}

pub async fn create_record(
    State(state): State<DashboardState>,
    user: AuthUser,
    Path((department, category)): Path<(String, String)>,
    Json(body): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<DepartmentRecord>), AppError> {
    let spec = resolve_table(&department, &category)?;
    body.validate(spec).map_err(AppError::BadRequest)?;

    let record = state
        .departments
        .create_record(spec, body, user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<DashboardState>,
    Path((department, category, id)): Path<(String, String, Uuid)>,
    Json(body): Json<UpdateRecordRequest>,
) -> Result<Json<DepartmentRecord>, AppError> {
    let spec = resolve_table(&department, &category)?;
    body.validate(spec).map_err(AppError::BadRequest)?;
    if body.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let record = state
        .departments
        .update_record(spec, id, body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<DashboardState>,
    Path((department, category, id)): Path<(String, String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let spec = resolve_table(&department, &category)?;
    if state.departments.delete_record(spec, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Record {} not found", id)))
    }
}
