//! Profile and user-account operations

use super::models::*;
use crate::backend::{row_str, RecordStore, Row, SelectQuery, SortDirection};
use crate::events::{EntityType, EventEmitter};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Backend table holding user profiles
pub const PROFILES_TABLE: &str = "profiles";

/// Manager for profiles and administrator user operations
pub struct ProfileManager {
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventEmitter>,
}

fn parse_profile(row: Row) -> Option<Profile> {
    match serde_json::from_value(serde_json::Value::Object(row)) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(table = PROFILES_TABLE, "Skipping malformed profile: {}", e);
            None
        }
    }
}

fn to_row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(row) => row,
        _ => Row::new(),
    }
}

impl ProfileManager {
    pub fn new(store: Arc<dyn RecordStore>, events: Arc<dyn EventEmitter>) -> Self {
        Self { store, events }
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        let rows = self
            .store
            .select(PROFILES_TABLE, &SelectQuery::new().eq("id", id).limit(1))
            .await?;
        Ok(rows.into_iter().next().and_then(parse_profile))
    }

    /// Look up a profile by e-mail together with its password hash (if any)
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(Profile, Option<String>)>> {
        let rows = self
            .store
            .select(
                PROFILES_TABLE,
                &SelectQuery::new().eq("email", email.trim().to_lowercase()).limit(1),
            )
            .await?;
        Ok(rows.into_iter().next().and_then(|row| {
            let hash = row_str(&row, "password_hash");
            parse_profile(row).map(|profile| (profile, hash))
        }))
    }

    /// Create a password-backed account
    pub async fn register(&self, email: &str, name: &str, password_hash: &str) -> Result<Profile> {
        let profile = Profile {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            name: name.trim().to_string(),
            department: None,
            position: None,
            phone: None,
            role: Role::Staff,
            created_at: Some(Utc::now()),
        };
        let mut row = to_row(serde_json::to_value(&profile)?);
        row.insert(
            "password_hash".to_string(),
            serde_json::Value::String(password_hash.to_string()),
        );

        let stored = self.store.insert(PROFILES_TABLE, row).await?;
        let profile = parse_profile(stored).unwrap_or(profile);
        info!(user_id = %profile.id, "User registered");
        self.events.emit_created(
            EntityType::User,
            &profile.id.to_string(),
            serde_json::to_value(&profile)?,
            None,
        );
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<Profile>> {
        let mut patch = Row::new();
        if let Some(name) = req.name {
            patch.insert("name".into(), name.trim().into());
        }
        if let Some(department) = req.department {
            patch.insert("department".into(), serde_json::to_value(department)?);
        }
        if let Some(position) = req.position {
            patch.insert("position".into(), position.into());
        }
        if let Some(phone) = req.phone {
            patch.insert("phone".into(), phone.into());
        }

        let payload = serde_json::Value::Object(patch.clone());
        let Some(stored) = self.store.update(PROFILES_TABLE, id, patch).await? else {
            return Ok(None);
        };
        self.events
            .emit_updated(EntityType::Profile, &id.to_string(), payload, None);
        Ok(parse_profile(stored))
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// All users ordered by name, optionally filtered by a name search
    pub async fn list_users(&self, search: Option<&str>) -> Result<Vec<Profile>> {
        let mut query = SelectQuery::new().order_by("name", SortDirection::Asc);
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.ilike("name", search);
        }
        let rows = self.store.select(PROFILES_TABLE, &query).await?;
        Ok(rows.into_iter().filter_map(parse_profile).collect())
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<Profile>> {
        let mut patch = Row::new();
        patch.insert("role".into(), serde_json::to_value(role)?);
        let Some(stored) = self.store.update(PROFILES_TABLE, id, patch).await? else {
            return Ok(None);
        };
        info!(user_id = %id, role = %role, "Role changed");
        self.events.emit_updated(
            EntityType::User,
            &id.to_string(),
            serde_json::json!({ "role": role }),
            None,
        );
        Ok(parse_profile(stored))
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let removed = self.store.delete(PROFILES_TABLE, id).await?;
        if removed {
            info!(user_id = %id, "User deleted");
            self.events
                .emit_deleted(EntityType::User, &id.to_string(), None);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockRecordStore;
    use crate::departments::Department;
    use crate::events::EventBus;
    use serde_json::json;

    fn manager(store: Arc<MockRecordStore>) -> ProfileManager {
        ProfileManager::new(store, Arc::new(EventBus::default()))
    }

    #[tokio::test]
    async fn test_register_stores_hash_but_profile_hides_it() {
        let store = Arc::new(MockRecordStore::new());
        let profiles = manager(store.clone());

        let profile = profiles
            .register("  Ana@Example.com ", "Ana Cruz", "$2b$04$hash")
            .await
            .unwrap();
        assert_eq!(profile.email, "ana@example.com");

        let rows = store.rows(PROFILES_TABLE).await;
        assert_eq!(rows[0]["password_hash"], "$2b$04$hash");
        assert!(!serde_json::to_string(&profile).unwrap().contains("password_hash"));

        let (found, hash) = profiles
            .find_credentials("ANA@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, profile.id);
        assert_eq!(hash.as_deref(), Some("$2b$04$hash"));
    }

    #[tokio::test]
    async fn test_update_profile_patch() {
        let id = Uuid::new_v4();
        let store = Arc::new(
            MockRecordStore::new()
                .with_rows(
                    PROFILES_TABLE,
                    vec![json!({"id": id.to_string(), "email": "b@x.io", "name": "Ben"})],
                )
                .await,
        );
        let profiles = manager(store);

        let updated = profiles
            .update_profile(
                id,
                UpdateProfileRequest {
                    department: Some(Department::Cluster6),
                    position: Some("Engineer".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.department, Some(Department::Cluster6));
        assert_eq!(updated.name, "Ben");

        let missing = profiles
            .update_profile(Uuid::new_v4(), UpdateProfileRequest::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_set_role_delete() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let store = Arc::new(
            MockRecordStore::new()
                .with_rows(
                    PROFILES_TABLE,
                    vec![
                        json!({"id": b.to_string(), "email": "z@x.io", "name": "Zed"}),
                        json!({"id": a.to_string(), "email": "a@x.io", "name": "Amy", "role": "manager"}),
                    ],
                )
                .await,
        );
        let profiles = manager(store);

        let users = profiles.list_users(None).await.unwrap();
        assert_eq!(users.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["Amy", "Zed"]);
        assert_eq!(profiles.list_users(Some("ze")).await.unwrap().len(), 1);

        let promoted = profiles.set_role(b, Role::Admin).await.unwrap().unwrap();
        assert!(promoted.is_admin());

        assert!(profiles.delete_user(a).await.unwrap());
        assert!(profiles.get_profile(a).await.unwrap().is_none());
    }
}
