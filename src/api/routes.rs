//! API route definitions

use super::handlers::{self, DashboardState};
use super::{
    auth_handlers, department_handlers, discussion_handlers, profile_handlers, schedule_handlers,
    user_handlers, ws_handlers,
};
use crate::auth::require_auth;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/version", get(handlers::get_version))
        .route("/auth/providers", get(auth_handlers::get_auth_providers))
        .route("/auth/login", post(auth_handlers::password_login))
        .route("/auth/register", post(auth_handlers::register))
        // WebSockets authenticate from the query string before upgrading
        .route("/ws/events", get(ws_handlers::ws_events))
        .route("/ws/discussions", get(ws_handlers::ws_discussions));

    let protected = Router::new()
        .route("/auth/me", get(auth_handlers::get_me))
        .route("/auth/refresh", post(auth_handlers::refresh_token))
        // ====================================================================
        // Department records
        // ====================================================================
        .route("/api/departments", get(department_handlers::list_departments))
        .route(
            "/api/departments/{department}/{category}",
            get(department_handlers::list_records).post(department_handlers::create_record),
        )
        .route(
            "/api/departments/{department}/{category}/{id}",
            get(department_handlers::get_record)
                .patch(department_handlers::update_record)
                .delete(department_handlers::delete_record),
        )
        // ====================================================================
        // Discussions
        // ====================================================================
        .route(
            "/api/departments/{department}/{category}/{id}/discussions",
            get(discussion_handlers::list_messages).post(discussion_handlers::post_message),
        )
        .route(
            "/api/discussions/{department}/{category}/{message_id}",
            delete(discussion_handlers::delete_message),
        )
        // ====================================================================
        // Profile and personal calendar
        // ====================================================================
        .route(
            "/api/profile",
            get(profile_handlers::get_profile).patch(profile_handlers::update_profile),
        )
        .route(
            "/api/profile/schedule",
            get(profile_handlers::list_entries).post(profile_handlers::create_entry),
        )
        .route(
            "/api/profile/schedule/{id}",
            patch(profile_handlers::update_entry).delete(profile_handlers::delete_entry),
        )
        // ====================================================================
        // Aggregated views
        // ====================================================================
        .route("/api/schedule/team", get(schedule_handlers::team_schedule))
        .route("/api/dashboard/calendar", get(schedule_handlers::calendar))
        .route("/api/dashboard/summary", get(schedule_handlers::summary))
        // ====================================================================
        // User administration
        // ====================================================================
        .route("/api/users", get(user_handlers::list_users))
        .route("/api/users/{id}", delete(user_handlers::delete_user))
        .route("/api/users/{id}/role", patch(user_handlers::set_role))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{server_state, test_auth_config};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn status(app: &Router, method: &str, uri: &str) -> StatusCode {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_public_routes_need_no_token() {
        let app = create_router(server_state(Some(test_auth_config())).await);
        assert_eq!(status(&app, "GET", "/health").await, StatusCode::OK);
        assert_eq!(status(&app, "GET", "/api/version").await, StatusCode::OK);
        assert_eq!(status(&app, "GET", "/auth/providers").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_reject_anonymous() {
        let app = create_router(server_state(Some(test_auth_config())).await);
        for (method, uri) in [
            ("GET", "/auth/me"),
            ("GET", "/api/departments"),
            ("GET", "/api/profile"),
            ("GET", "/api/schedule/team?from=2024-01-01&to=2024-01-31"),
            ("GET", "/api/dashboard/summary?from=2024-01-01&to=2024-01-31"),
            ("GET", "/api/users"),
        ] {
            assert_eq!(status(&app, method, uri).await, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_no_auth_config_denies_protected_routes() {
        let app = create_router(server_state(None).await);
        assert_eq!(status(&app, "GET", "/api/departments").await, StatusCode::FORBIDDEN);
        assert_eq!(status(&app, "GET", "/health").await, StatusCode::OK);
    }
}
