//! WebSocket authentication (pre-upgrade).
//!
//! Browsers cannot set headers on a WebSocket handshake, so the token may come
//! from the `token` query parameter as well as from `Authorization: Bearer`.
//! Authentication happens BEFORE the upgrade: bad credentials get a plain
//! HTTP 401/403 and no connection is opened.

use crate::api::handlers::AppError;
use crate::auth::jwt::{decode_jwt, Claims};
use crate::AuthConfig;
use axum::extract::ws::{Message, WebSocket};
use axum::http::HeaderMap;
use tracing::debug;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Validate the upgrade request's token.
///
/// Same rules as `require_auth`: no auth config denies everything, a missing
/// or invalid token is 401, an e-mail outside the allowed domain is 403.
pub fn ws_authenticate(
    headers: &HeaderMap,
    query_token: Option<&str>,
    auth_config: &Option<AuthConfig>,
) -> Result<Claims, AppError> {
    let config = auth_config.as_ref().ok_or_else(|| {
        AppError::Forbidden("Authentication not configured, access denied".to_string())
    })?;

    let token = query_token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(headers))
        .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

    let claims = decode_jwt(token, &config.jwt_secret).map_err(|e| {
        debug!("WS auth: invalid token: {}", e);
        AppError::Unauthorized(format!("Invalid token: {}", e))
    })?;

    if !config.email_allowed(&claims.email) {
        return Err(AppError::Forbidden("Email domain not allowed".to_string()));
    }
    Ok(claims)
}

/// First frame on every authenticated socket
pub async fn send_auth_ok(socket: &mut WebSocket, claims: &Claims) {
    let auth_ok = serde_json::json!({
        "type": "auth_ok",
        "user": {
            "id": claims.sub,
            "email": claims.email,
            "name": claims.name,
        }
    });
    let _ = socket.send(Message::Text(auth_ok.to_string().into())).await;
}
