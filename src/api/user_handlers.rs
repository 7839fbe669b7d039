//! User administration handlers (administrators only)

use crate::api::handlers::{AppError, DashboardState};
use crate::api::{PaginatedResponse, PaginationParams};
use crate::auth::AuthUser;
use crate::profile::{Profile, Role};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize, Default)]
pub struct UsersListQuery {
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// GET /api/users?search=
pub async fn list_users(
    State(state): State<DashboardState>,
    user: AuthUser,
    Query(query): Query<UsersListQuery>,
) -> Result<Json<PaginatedResponse<Profile>>, AppError> {
    state.require_admin(&user).await?;
    query.pagination.validate().map_err(AppError::BadRequest)?;

    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
    let users = state.profiles.list_users(search).await?;
    Ok(Json(PaginatedResponse::page(users, &query.pagination)))
}

/// PATCH /api/users/{id}/role
pub async fn set_role(
    State(state): State<DashboardState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<Profile>, AppError> {
    state.require_admin(&user).await?;
    if id == user.user_id && body.role != Role::Admin {
        return Err(AppError::Conflict(
            "Administrators cannot remove their own admin role".to_string(),
        ));
    }

    let profile = state
        .profiles
        .set_role(id, body.role)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(profile))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<DashboardState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.require_admin(&user).await?;
    if id == user.user_id {
        return Err(AppError::Conflict(
            "Administrators cannot delete their own account".to_string(),
        ));
    }

    if state.profiles.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("User {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::backend::mock::MockRecordStore;
    use crate::test_helpers::{bearer_for, profile_row, server_state_with_store, test_auth_config};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Users {
        app: Router,
        admin: Uuid,
        staff: Uuid,
    }

    async fn setup() -> Users {
        let (admin, staff) = (Uuid::new_v4(), Uuid::new_v4());
        let store = MockRecordStore::new()
            .with_rows(
                "profiles",
                vec![
                    profile_row(admin, "Ada Admin", "admin"),
                    profile_row(staff, "Sam Staff", "staff"),
                ],
            )
            .await;
        Users {
            app: create_router(server_state_with_store(Arc::new(store), Some(test_auth_config())).await),
            admin,
            staff,
        }
    }

    async fn call(app: &Router, auth: &str, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", auth)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_staff_cannot_administer() {
        let u = setup().await;
        let auth = bearer_for(u.staff, "sam.staff@ops.example.com", "Sam Staff");

        let (status, _) = call(&u.app, &auth, "GET", "/api/users", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let uri = format!("/api/users/{}/role", u.staff);
        let (status, _) = call(&u.app, &auth, "PATCH", &uri, Some(json!({"role": "admin"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_lists_and_promotes() {
        let u = setup().await;
        let auth = bearer_for(u.admin, "ada.admin@ops.example.com", "Ada Admin");

        let (status, body) = call(&u.app, &auth, "GET", "/api/users?search=sam", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["name"], "Sam Staff");

        let uri = format!("/api/users/{}/role", u.staff);
        let (status, body) = call(&u.app, &auth, "PATCH", &uri, Some(json!({"role": "manager"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "manager");

        let (status, _) = call(&u.app, &auth, "PATCH", &uri, Some(json!({"role": "owner"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_or_delete_self() {
        let u = setup().await;
        let auth = bearer_for(u.admin, "ada.admin@ops.example.com", "Ada Admin");

        let role_uri = format!("/api/users/{}/role", u.admin);
        let (status, _) = call(&u.app, &auth, "PATCH", &role_uri, Some(json!({"role": "staff"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let self_uri = format!("/api/users/{}", u.admin);
        let (status, _) = call(&u.app, &auth, "DELETE", &self_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let staff_uri = format!("/api/users/{}", u.staff);
        let (status, _) = call(&u.app, &auth, "DELETE", &staff_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&u.app, &auth, "DELETE", &staff_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
