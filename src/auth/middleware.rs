//! Auth middleware for the protected API router.
//!
//! Validates Bearer tokens and injects `Claims` into request extensions.
//! Deny-by-default: without an `auth` config section every request is rejected.

use crate::api::handlers::{AppError, DashboardState};
use crate::auth::jwt::decode_jwt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware that requires a valid JWT Bearer token.
///
/// 1. No `auth_config` → 403
/// 2. Missing or malformed `Authorization` header → 401
/// 3. Invalid or expired token → 401
/// 4. E-mail outside `allowed_email_domain` → 403
pub async fn require_auth(
    State(state): State<DashboardState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_config = state.auth_config.as_ref().ok_or_else(|| {
        AppError::Forbidden("Authentication not configured, access denied".to_string())
    })?;

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))?;

    let claims = decode_jwt(token, &auth_config.jwt_secret)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    if !auth_config.email_allowed(&claims.email) {
        return Err(AppError::Forbidden("Email domain not allowed".to_string()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
