//! Test helper factories and mock state builders
#![allow(dead_code)]

use crate::api::handlers::{DashboardState, ServerState};
use crate::auth::encode_jwt;
use crate::backend::mock::MockRecordStore;
use crate::backend::RecordStore;
use crate::events::EventBus;
use crate::{AppState, AuthConfig, Config};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

fn mock_config(auth_config: Option<AuthConfig>) -> Config {
    Config {
        backend_url: "http://mock:54321".to_string(),
        backend_api_key: "mock-key".to_string(),
        backend_timeout_secs: 1,
        server_port: 0,
        auth_config,
    }
}

/// Server state over an empty in-memory store
pub async fn server_state(auth_config: Option<AuthConfig>) -> DashboardState {
    server_state_with_store(Arc::new(MockRecordStore::new()), auth_config).await
}

/// Server state over a pre-seeded store
pub async fn server_state_with_store(
    store: Arc<dyn RecordStore>,
    auth_config: Option<AuthConfig>,
) -> DashboardState {
    let app = AppState::with_store(store, mock_config(auth_config));
    Arc::new(ServerState::new(app, Arc::new(EventBus::default())))
}

/// AuthConfig with a known secret and no restrictions
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_secs: 3600,
        allowed_email_domain: None,
        allow_registration: false,
        root_account: None,
    }
}

/// `Bearer <token>` header value for a user
pub fn bearer_for(user_id: Uuid, email: &str, name: &str) -> String {
    let token = encode_jwt(user_id, email, name, TEST_SECRET, 3600).expect("encode test token");
    format!("Bearer {}", token)
}

/// Profile row as stored in the backend
pub fn profile_row(id: Uuid, name: &str, role: &str) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "email": format!("{}@ops.example.com", name.to_lowercase().replace(' ', ".")),
        "name": name,
        "role": role,
    })
}
