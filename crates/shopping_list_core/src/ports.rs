//! crates/shopping_list_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthUser, CheckoutReceipt, Notification, ShoppingList, ShoppingListItem, Store,
    UserCredentials, UserPreferences,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The persistence gateway: users, auth sessions, lists, items and preferences.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users & Auth ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: Option<&str>,
    ) -> PortResult<AuthUser>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<AuthUser>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Shopping Lists ---
    async fn create_shopping_list(&self, user_id: Uuid, name: &str) -> PortResult<ShoppingList>;

    async fn get_shopping_list(&self, list_id: Uuid) -> PortResult<ShoppingList>;

    /// Newest first.
    async fn get_user_shopping_lists(&self, user_id: Uuid) -> PortResult<Vec<ShoppingList>>;

    async fn delete_shopping_list(&self, list_id: Uuid) -> PortResult<()>;

    // --- Items ---
    /// Upserts every item keyed by its id. Product fields are stored flattened.
    async fn save_shopping_list_items(
        &self,
        list_id: Uuid,
        items: &[ShoppingListItem],
    ) -> PortResult<()>;

    async fn fetch_shopping_list_items(&self, list_id: Uuid) -> PortResult<Vec<ShoppingListItem>>;

    // --- Preferences ---
    async fn fetch_user_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>>;

    async fn save_user_preferences(
        &self,
        user_id: Uuid,
        preferences: &UserPreferences,
    ) -> PortResult<()>;
}

/// One ranked label returned by a text-classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[async_trait]
pub trait TextClassificationService: Send + Sync {
    /// Sends `text` to the remote model, authenticated with `token`.
    async fn classify_text(&self, text: &str, token: &str) -> PortResult<Vec<LabelScore>>;
}

/// Small client-local key-value storage (the classifier token lives here).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;
    async fn remove(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Places the order for every item against `store`. All-or-nothing.
    async fn checkout(&self, items: &[ShoppingListItem], store: Store)
        -> PortResult<CheckoutReceipt>;
}

/// Receives user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<F> Notifier for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}
