//! Discussion thread handlers

use crate::api::handlers::{resolve_table, AppError, DashboardState};
use crate::auth::AuthUser;
use crate::discussions::{DeleteOutcome, DiscussionMessage, PostMessageRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

/// GET /api/departments/{department}/{category}/{id}/discussions
pub async fn list_messages(
    State(state): State<DashboardState>,
    Path((department, category, record_id)): Path<(String, String, Uuid)>,
) -> Result<Json<Vec<DiscussionMessage>>, AppError> {
    let spec = resolve_table(&department, &category)?;
    let messages = state.discussions.list_messages(spec, record_id).await?;
    Ok(Json(messages))
}

/// POST /api/departments/{department}/{category}/{id}/discussions
pub async fn post_message(
    State(state): State<DashboardState>,
    user: AuthUser,
    Path((department, category, record_id)): Path<(String, String, Uuid)>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<DiscussionMessage>), AppError> {
    let spec = resolve_table(&department, &category)?;
    body.validate().map_err(AppError::BadRequest)?;

    if state.departments.get_record(spec, record_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Record {} not found", record_id)));
    }

    let author = state.author(&user).await?;
    let message = state
        .discussions
        .post_message(spec, record_id, &author, body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// DELETE /api/discussions/{department}/{category}/{message_id}
pub async fn delete_message(
    State(state): State<DashboardState>,
    user: AuthUser,
    Path((department, category, message_id)): Path<(String, String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let spec = resolve_table(&department, &category)?;
    let author = state.author(&user).await?;

    match state
        .discussions
        .delete_message(spec, message_id, &author)
        .await?
    {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::NotFound => Err(AppError::NotFound(format!(
            "Message {} not found",
            message_id
        ))),
        DeleteOutcome::Forbidden => Err(AppError::Forbidden(
            "Only the author or an administrator can delete this message".to_string(),
        )),
    }
}
