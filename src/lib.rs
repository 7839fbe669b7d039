//! Ops Dashboard
//!
//! Backend for a departmental operations dashboard:
//! - Department schedule tables (BDM, Cluster 6, HiTech) with discussion threads
//! - Personal calendars and profiles
//! - Team schedule and dashboard calendar views across departments
//! - User administration
//!
//! All data lives in a hosted PostgREST-style backend reached through
//! [`backend::RecordStore`].

pub mod api;
pub mod auth;
pub mod backend;
pub mod departments;
pub mod discussions;
pub mod events;
pub mod profile;
pub mod schedule;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub backend: BackendYamlConfig,
    /// Auth section — if absent, auth_config will be None (deny-by-default)
    pub auth: Option<AuthConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Hosted backend section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendYamlConfig {
    pub url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for BackendYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".into(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Authentication configuration.
///
/// - No `auth` section → `auth_config = None` → protected routes answer 403
/// - `root_account` → a config-defined administrator can log in with a password
/// - Users with a `password_hash` in the profiles table can always log in
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (HS256, minimum 32 characters)
    pub jwt_secret: String,
    /// JWT token lifetime in seconds (default: 28800 = 8h)
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Optional domain restriction (e.g. "ops.example.com")
    pub allowed_email_domain: Option<String>,
    /// Allow new user registration via POST /auth/register (default: false)
    #[serde(default)]
    pub allow_registration: bool,
    /// Administrator account defined in config.yaml, no backend row needed
    pub root_account: Option<RootAccountConfig>,
}

/// Root account configuration.
///
/// `password_hash` holds either a bcrypt hash (`$2a$`/`$2b$`/`$2y$`) or a
/// plaintext password that is hashed at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct RootAccountConfig {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

fn default_jwt_expiry() -> u64 {
    28800 // 8 hours
}

impl RootAccountConfig {
    /// Deterministic id of the root account, derived from its e-mail
    pub fn user_id(&self) -> uuid::Uuid {
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, self.email.as_bytes())
    }

    fn has_bcrypt_hash(&self) -> bool {
        ["$2a$", "$2b$", "$2y$"]
            .iter()
            .any(|prefix| self.password_hash.starts_with(prefix))
    }
}

impl AuthConfig {
    /// Returns true if password login is available for the root account
    pub fn has_password_auth(&self) -> bool {
        self.root_account.is_some()
    }

    /// Whether `user_id` is the configured root account
    pub fn is_root(&self, user_id: uuid::Uuid) -> bool {
        self.root_account
            .as_ref()
            .is_some_and(|root| root.user_id() == user_id)
    }

    /// Whether `email` is acceptable under `allowed_email_domain`
    pub fn email_allowed(&self, email: &str) -> bool {
        match &self.allowed_email_domain {
            Some(domain) => email
                .to_lowercase()
                .ends_with(&format!("@{}", domain.to_lowercase())),
            None => true,
        }
    }

    /// Hash a plaintext root password in place
    pub fn hash_root_password(&mut self) -> Result<()> {
        if let Some(root) = self.root_account.as_mut() {
            if !root.has_bcrypt_hash() {
                tracing::warn!(
                    "auth.root_account.password_hash is plaintext; hashing at startup. Store a bcrypt hash instead."
                );
                root.password_hash = bcrypt::hash(&root.password_hash, bcrypt::DEFAULT_COST)
                    .context("Failed to hash root account password")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub backend_api_key: String,
    pub backend_timeout_secs: u64,
    pub server_port: u16,
    /// Auth config — None means deny-by-default (no auth section in YAML)
    pub auth_config: Option<AuthConfig>,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let mut auth_config = yaml.auth;
        if let Some(auth) = auth_config.as_mut() {
            auth.hash_root_password()?;
        }

        Ok(Self {
            backend_url: std::env::var("BACKEND_URL").unwrap_or(yaml.backend.url),
            backend_api_key: std::env::var("BACKEND_API_KEY").unwrap_or(yaml.backend.api_key),
            backend_timeout_secs: std::env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.backend.timeout_secs),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            auth_config,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn backend::RecordStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state backed by the hosted REST backend
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(backend::RestClient::new(
            &config.backend_url,
            &config.backend_api_key,
            Duration::from_secs(config.backend_timeout_secs),
        )?);
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<dyn backend::RecordStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Start the HTTP server and serve until the process is stopped
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config)?;
    let event_bus = Arc::new(events::EventBus::default());
    let server_state = Arc::new(api::ServerState::new(state, event_bus));

    if server_state.auth_config.is_none() {
        tracing::warn!("No auth section configured: every protected route will answer 403");
    }

    let app = api::create_router(server_state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Ops dashboard listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
server:
  port: 9090

backend:
  url: https://project.backend.example
  api_key: anon-key
  timeout_secs: 3

auth:
  jwt_secret: "super-secret-key-min-32-characters!"
  jwt_expiry_secs: 3600
  allowed_email_domain: "ops.example.com"
  allow_registration: true
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.backend.url, "https://project.backend.example");
        assert_eq!(config.backend.api_key, "anon-key");
        assert_eq!(config.backend.timeout_secs, 3);

        let auth = config.auth.unwrap();
        assert_eq!(auth.jwt_expiry_secs, 3600);
        assert_eq!(auth.allowed_email_domain, Some("ops.example.com".into()));
        assert!(auth.allow_registration);
        assert!(!auth.has_password_auth());
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.backend.url, "http://localhost:54321");
        assert_eq!(config.backend.timeout_secs, 10);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_auth_defaults() {
        let yaml = r#"
auth:
  jwt_secret: "min-32-chars-secret-key-for-test!"
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        let auth = config.auth.unwrap();
        assert_eq!(auth.jwt_expiry_secs, 28800);
        assert!(auth.allowed_email_domain.is_none());
        assert!(!auth.allow_registration);
        assert!(auth.email_allowed("anyone@anywhere.io"));
    }

    #[test]
    fn test_email_domain_check_is_case_insensitive() {
        let yaml = r#"
auth:
  jwt_secret: "min-32-chars-secret-key-for-test!"
  allowed_email_domain: "Ops.Example.com"
"#;
        let auth = serde_yaml::from_str::<YamlConfig>(yaml).unwrap().auth.unwrap();
        assert!(auth.email_allowed("ana@ops.example.com"));
        assert!(auth.email_allowed("ANA@OPS.EXAMPLE.COM"));
        assert!(!auth.email_allowed("ana@example.com"));
        assert!(!auth.email_allowed("ana@evilops.example.com.io"));
    }

    #[test]
    fn test_root_account_plaintext_is_hashed() {
        let yaml = r#"
auth:
  jwt_secret: "super-secret-key-min-32-characters!"
  root_account:
    email: "admin@example.com"
    name: "Admin"
    password_hash: "plaintext-will-be-hashed"
"#;
        let mut auth = serde_yaml::from_str::<YamlConfig>(yaml).unwrap().auth.unwrap();
        auth.hash_root_password().unwrap();

        let root = auth.root_account.as_ref().unwrap();
        assert!(root.password_hash.starts_with("$2"));
        assert!(bcrypt::verify("plaintext-will-be-hashed", &root.password_hash).unwrap());

        // Already hashed values are kept as-is
        let hashed = root.password_hash.clone();
        auth.hash_root_password().unwrap();
        assert_eq!(auth.root_account.as_ref().unwrap().password_hash, hashed);
    }

    #[test]
    fn test_root_user_id_is_stable() {
        let root = RootAccountConfig {
            email: "admin@example.com".into(),
            name: "Admin".into(),
            password_hash: "$2b$04$x".into(),
        };
        assert_eq!(root.user_id(), root.user_id());
        assert_eq!(root.user_id().get_version_num(), 5);
    }

    /// Single test for YAML file loading and env var overrides, to avoid
    /// parallel env var races.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "BACKEND_URL",
                "BACKEND_API_KEY",
                "BACKEND_TIMEOUT_SECS",
                "SERVER_PORT",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
server:
  port: 9999
backend:
  url: http://yaml-backend:54321
  api_key: yaml-key
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 9999);
        assert_eq!(config.backend_url, "http://yaml-backend:54321");
        assert_eq!(config.backend_api_key, "yaml-key");
        assert_eq!(config.backend_timeout_secs, 10);
        assert!(config.auth_config.is_none());

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("BACKEND_URL", "http://env-backend:54321");
        std::env::set_var("BACKEND_TIMEOUT_SECS", "30");
        std::env::set_var("SERVER_PORT", "7777");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.backend_url, "http://env-backend:54321");
        assert_eq!(config.backend_timeout_secs, 30);
        assert_eq!(config.server_port, 7777);
        assert_eq!(config.backend_api_key, "yaml-key");

        clear_env();

        // --- Phase 3: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-ops-dashboard-config.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.backend_url, "http://localhost:54321");
        assert!(config.auth_config.is_none());

        // --- Phase 4: Unparseable YAML → defaults ---
        std::fs::write(&file_path, "server: [not, a, map").unwrap();
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 8080);
    }
}
