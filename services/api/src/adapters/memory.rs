//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port.
//!
//! Rows are stored in the same flattened shape the Postgres adapter writes, so
//! a save/load cycle here loses exactly what it would lose against the real
//! database. Used by the integration tests, and by the server when started
//! with `DATABASE_URL=memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopping_list_core::domain::{
    AuthUser, ShoppingList, ShoppingListItem, UserCredentials, UserPreferences,
};
use shopping_list_core::ports::{DatabaseService, PortError, PortResult};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::db::{ShoppingListItemRecord, ShoppingListRecord, UserPreferencesRecord, UserRecord};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    lists: HashMap<Uuid, ShoppingListRecord>,
    items: HashMap<Uuid, ShoppingListItemRecord>,
    preferences: HashMap<Uuid, UserPreferencesRecord>,
}

#[derive(Default)]
pub struct InMemoryDb {
    tables: Mutex<Tables>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> PortResult<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory database lock poisoned".to_string()))
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: Option<&str>,
    ) -> PortResult<AuthUser> {
        let mut t = self.tables()?;
        if t.users.values().any(|u| u.email == email) {
            return Err(PortError::InvalidInput(format!(
                "Email {} is already registered",
                email
            )));
        }
        let record = UserRecord {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            hashed_password: hashed_password.to_string(),
        };
        let user = record.to_domain();
        t.users.insert(record.user_id, record);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let t = self.tables()?;
        t.users
            .values()
            .find(|u| u.email == email)
            .map(|u| UserCredentials {
                user: u.to_domain(),
                hashed_password: u.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<AuthUser> {
        let t = self.tables()?;
        t.users
            .get(&user_id)
            .map(UserRecord::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.tables()?
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.tables()?.auth_sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables()?.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn create_shopping_list(&self, user_id: Uuid, name: &str) -> PortResult<ShoppingList> {
        let now = Utc::now();
        let record = ShoppingListRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tables()?.lists.insert(record.id, record.clone());
        Ok(record.to_domain())
    }

    async fn get_shopping_list(&self, list_id: Uuid) -> PortResult<ShoppingList> {
        self.tables()?
            .lists
            .get(&list_id)
            .cloned()
            .map(ShoppingListRecord::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Shopping list {} not found", list_id)))
    }

    async fn get_user_shopping_lists(&self, user_id: Uuid) -> PortResult<Vec<ShoppingList>> {
        let t = self.tables()?;
        let mut lists: Vec<ShoppingListRecord> = t
            .lists
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lists.into_iter().map(ShoppingListRecord::to_domain).collect())
    }

    async fn delete_shopping_list(&self, list_id: Uuid) -> PortResult<()> {
        let mut t = self.tables()?;
        t.lists.remove(&list_id);
        t.items.retain(|_, item| item.list_id != list_id);
        Ok(())
    }

    async fn save_shopping_list_items(
        &self,
        list_id: Uuid,
        items: &[ShoppingListItem],
    ) -> PortResult<()> {
        let mut t = self.tables()?;
        let Some(list) = t.lists.get_mut(&list_id) else {
            return Err(PortError::NotFound(format!(
                "Shopping list {} not found",
                list_id
            )));
        };
        list.updated_at = Utc::now();
        for (position, item) in items.iter().enumerate() {
            let record = ShoppingListItemRecord::from_domain(list_id, position, item);
            t.items.insert(record.id, record);
        }
        Ok(())
    }

    async fn fetch_shopping_list_items(&self, list_id: Uuid) -> PortResult<Vec<ShoppingListItem>> {
        let t = self.tables()?;
        let mut records: Vec<ShoppingListItemRecord> = t
            .items
            .values()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.position);
        Ok(records
            .into_iter()
            .map(ShoppingListItemRecord::to_domain)
            .collect())
    }

    async fn fetch_user_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>> {
        Ok(self
            .tables()?
            .preferences
            .get(&user_id)
            .cloned()
            .map(UserPreferencesRecord::to_domain))
    }

    async fn save_user_preferences(
        &self,
        user_id: Uuid,
        preferences: &UserPreferences,
    ) -> PortResult<()> {
        self.tables()?
            .preferences
            .insert(user_id, UserPreferencesRecord::from_domain(user_id, preferences));
        Ok(())
    }
}
