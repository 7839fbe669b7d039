//! Shared server state, error mapping and service-level handlers

use crate::auth::AuthUser;
use crate::departments::{lookup, Department, DepartmentManager, TableSpec};
use crate::discussions::{Author, DiscussionManager};
use crate::events::EventBus;
use crate::profile::{PersonalScheduleManager, ProfileManager};
use crate::schedule::{DashboardService, TeamScheduler};
use crate::{AppState, AuthConfig};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub app: AppState,
    pub departments: DepartmentManager,
    pub discussions: DiscussionManager,
    pub profiles: ProfileManager,
    pub personal: PersonalScheduleManager,
    pub team: TeamScheduler,
    pub dashboard: DashboardService,
    pub event_bus: Arc<EventBus>,
    /// Auth config — None means deny-by-default
    pub auth_config: Option<AuthConfig>,
}

pub type DashboardState = Arc<ServerState>;

impl ServerState {
    /// Wire every manager to the application's store and the event bus
    pub fn new(app: AppState, event_bus: Arc<EventBus>) -> Self {
        let store = app.store.clone();
        Self {
            departments: DepartmentManager::new(store.clone(), event_bus.clone()),
            discussions: DiscussionManager::new(store.clone(), event_bus.clone()),
            profiles: ProfileManager::new(store.clone(), event_bus.clone()),
            personal: PersonalScheduleManager::new(store.clone(), event_bus.clone()),
            team: TeamScheduler::new(store.clone()),
            dashboard: DashboardService::new(store),
            auth_config: app.config.auth_config.clone(),
            event_bus,
            app,
        }
    }

    /// Whether `user` is the root account or has the admin role
    pub async fn is_admin(&self, user: &AuthUser) -> Result<bool, AppError> {
        if self
            .auth_config
            .as_ref()
            .is_some_and(|auth| auth.is_root(user.user_id))
        {
            return Ok(true);
        }
        Ok(self
            .profiles
            .get_profile(user.user_id)
            .await?
            .is_some_and(|profile| profile.is_admin()))
    }

    pub async fn require_admin(&self, user: &AuthUser) -> Result<(), AppError> {
        if self.is_admin(user).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator access required".to_string()))
        }
    }

    /// Message author identity for the authenticated user
    pub async fn author(&self, user: &AuthUser) -> Result<Author, AppError> {
        Ok(Author {
            id: user.user_id,
            name: user.name.clone(),
            is_admin: self.is_admin(user).await?,
        })
    }
}

/// Resolve `/{department}/{category}` path segments to a catalog table
pub fn resolve_table(department: &str, category: &str) -> Result<&'static TableSpec, AppError> {
    let dept: Department = department.parse().map_err(AppError::NotFound)?;
    lookup(dept, category).ok_or_else(|| {
        AppError::NotFound(format!("Unknown category '{}' for {}", category, dept.label()))
    })
}

// ============================================================================
// Health check
// ============================================================================

#[derive(Serialize)]
pub struct ServiceHealthStatus {
    pub backend: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealthStatus,
}

/// Health check: 200 when the backend answers, 503 otherwise
pub async fn health(State(state): State<DashboardState>) -> (StatusCode, Json<HealthResponse>) {
    let backend_ok = state.app.store.health_check().await.unwrap_or(false);

    let (http_status, status, backend) = if backend_ok {
        (StatusCode::OK, "ok", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealthStatus {
                backend: backend.to_string(),
            },
        }),
    )
}

// ============================================================================
// Version info
// ============================================================================

#[derive(Serialize)]
pub struct VersionBuild {
    pub target: String,
    pub profile: &'static str,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub build: VersionBuild,
}

/// GET /api/version
pub async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        build: VersionBuild {
            target: format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        },
    })
}

// ============================================================================
// Error handling
// ============================================================================

/// API error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}
