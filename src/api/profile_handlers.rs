//! Own profile and personal calendar handlers

use crate::api::handlers::{AppError, DashboardState};
use crate::api::DateRangeQuery;
use crate::auth::AuthUser;
use crate::profile::{
    CreatePersonalEntryRequest, EntryUpdate, PersonalEntry, Profile, UpdatePersonalEntryRequest,
    UpdateProfileRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

/// GET /api/profile
pub async fn get_profile(
    State(state): State<DashboardState>,
    user: AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .get_profile(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

/// PATCH /api/profile
pub async fn update_profile(
    State(state): State<DashboardState>,
    user: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    if body.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    let profile = state
        .profiles
        .update_profile(user.user_id, body)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

/// GET /api/profile/schedule?from=&to=
pub async fn list_entries(
    State(state): State<DashboardState>,
    user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<PersonalEntry>>, AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(AppError::BadRequest("'from' must not be after 'to'".to_string()));
        }
    }
    let entries = state
        .personal
        .list_entries(user.user_id, query.from, query.to)
        .await?;
    Ok(Json(entries))
}

/// POST /api/profile/schedule
pub async fn create_entry(
    State(state): State<DashboardState>,
    user: AuthUser,
    Json(body): Json<CreatePersonalEntryRequest>,
) -> Result<(StatusCode, Json<PersonalEntry>), AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let entry = state.personal.create_entry(user.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PATCH /api/profile/schedule/{id}
pub async fn update_entry(
    State(state): State<DashboardState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePersonalEntryRequest>,
) -> Result<Json<PersonalEntry>, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    match state.personal.update_entry(user.user_id, id, body).await? {
        EntryUpdate::Updated(entry) => Ok(Json(entry)),
        EntryUpdate::NotFound => Err(AppError::NotFound(format!("Entry {} not found", id))),
        EntryUpdate::Invalid(msg) => Err(AppError::BadRequest(msg)),
    }
}

/// DELETE /api/profile/schedule/{id}
pub async fn delete_entry(
    State(state): State<DashboardState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.personal.delete_entry(user.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Entry {} not found", id)))
    }
}
