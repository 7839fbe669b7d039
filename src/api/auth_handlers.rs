//! Authentication route handlers.
//!
//! - `GET  /auth/providers` — which login methods are available (public)
//! - `POST /auth/login`     — e-mail/password login (root account, then profiles)
//! - `POST /auth/register`  — create a password account (when enabled)
//! - `GET  /auth/me`        — the authenticated user (protected)
//! - `POST /auth/refresh`   — fresh token from a still-valid one (protected)

use crate::api::handlers::{AppError, DashboardState};
use crate::auth::{issue_token, AuthUser};
use crate::profile::{Profile, Role};
use crate::AuthConfig;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthProvidersResponse {
    pub auth_required: bool,
    pub password: bool,
    pub allow_registration: bool,
}

/// Public user info (safe to send to client)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<Profile> for UserResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            name: p.name,
            role: p.role,
        }
    }
}

fn configured(state: &DashboardState) -> Result<&AuthConfig, AppError> {
    state
        .auth_config
        .as_ref()
        .ok_or_else(|| AppError::Forbidden("Authentication not configured".to_string()))
}

fn token_response(config: &AuthConfig, user: UserResponse) -> Result<Json<AuthTokenResponse>, AppError> {
    let token = issue_token(config, user.id, &user.email, &user.name)?;
    Ok(Json(AuthTokenResponse { token, user }))
}

/// GET /auth/providers
pub async fn get_auth_providers(State(state): State<DashboardState>) -> Json<AuthProvidersResponse> {
    Json(match state.auth_config.as_ref() {
        None => AuthProvidersResponse {
            auth_required: false,
            password: false,
            allow_registration: false,
        },
        Some(config) => AuthProvidersResponse {
            auth_required: true,
            password: true,
            allow_registration: config.allow_registration,
        },
    })
}

/// POST /auth/login
///
/// The root account is checked first, then the profiles table. Errors never
/// reveal whether the e-mail exists.
pub async fn password_login(
    State(state): State<DashboardState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    let config = configured(&state)?;
    let invalid_credentials = || AppError::Unauthorized("Invalid email or password".to_string());
    let email = req.email.trim().to_lowercase();

    if let Some(root) = config.root_account.as_ref() {
        if root.email.eq_ignore_ascii_case(&email) {
            if !bcrypt::verify(&req.password, &root.password_hash).unwrap_or(false) {
                return Err(invalid_credentials());
            }
            info!("Root account logged in");
            return token_response(
                config,
                UserResponse {
                    id: root.user_id(),
                    email: root.email.clone(),
                    name: root.name.clone(),
                    role: Role::Admin,
                },
            );
        }
    }

    let (profile, hash) = state
        .profiles
        .find_credentials(&email)
        .await?
        .ok_or_else(invalid_credentials)?;
    let hash = hash.ok_or_else(invalid_credentials)?;
    if !bcrypt::verify(&req.password, &hash).unwrap_or(false) {
        return Err(invalid_credentials());
    }
    if !config.email_allowed(&profile.email) {
        return Err(AppError::Forbidden("Email domain not allowed".to_string()));
    }

    token_response(config, profile.into())
}

/// POST /auth/register — creates a staff account and logs it in
pub async fn register(
    State(state): State<DashboardState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    let config = configured(&state)?;
    if !config.allow_registration {
        return Err(AppError::Forbidden("Registration is disabled".to_string()));
    }
    validate_registration(&req, config)?;

    if state.profiles.find_credentials(&req.email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
    let profile = state
        .profiles
        .register(&req.email, &req.name, &password_hash)
        .await?;

    token_response(config, profile.into())
}

fn validate_registration(req: &RegisterRequest, config: &AuthConfig) -> Result<(), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    let email = req.email.trim().to_lowercase();
    let domain_ok = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !domain_ok {
        return Err(AppError::BadRequest("Invalid email format".to_string()));
    }

    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if !config.email_allowed(&email) {
        return Err(AppError::Forbidden("Email domain not allowed".to_string()));
    }
    Ok(())
}

/// GET /auth/me
pub async fn get_me(
    State(state): State<DashboardState>,
    user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    if let Some(profile) = state.profiles.get_profile(user.user_id).await? {
        return Ok(Json(profile.into()));
    }
    let is_root = state
        .auth_config
        .as_ref()
        .is_some_and(|config| config.is_root(user.user_id));
    if is_root {
        return Ok(Json(UserResponse {
            id: user.user_id,
            email: user.email,
            name: user.name,
            role: Role::Admin,
        }));
    }
    Err(AppError::NotFound("User not found".to_string()))
}

/// POST /auth/refresh
pub async fn refresh_token(
    State(state): State<DashboardState>,
    user: AuthUser,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let config = configured(&state)?;
    let token = issue_token(config, user.user_id, &user.email, &user.name)?;
    Ok(Json(RefreshTokenResponse { token }))
}
