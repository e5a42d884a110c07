//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopping_list_core::domain::{
    AuthUser, DietaryRestrictions, Product, ProductCategory, ShoppingList, ShoppingListItem, Store,
    StorePreference, UserCredentials, UserPreferences,
};
use shopping_list_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
pub(crate) struct UserRecord {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub hashed_password: String,
}
impl UserRecord {
    pub fn to_domain(&self) -> AuthUser {
        AuthUser::new(self.user_id, self.email.clone(), self.display_name.as_deref())
    }

    pub fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user: self.to_domain(),
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow, Clone)]
pub(crate) struct ShoppingListRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
impl ShoppingListRecord {
    pub fn to_domain(self) -> ShoppingList {
        ShoppingList {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// One item row with its product flattened into nullable columns.
#[derive(FromRow, Clone, Debug)]
pub(crate) struct ShoppingListItemRecord {
    pub id: Uuid,
    pub list_id: Uuid,
    pub position: i32,
    pub text: String,
    pub category: String,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub product_price: Option<f64>,
    pub product_image: Option<String>,
    pub product_store: Option<String>,
    pub quantity: Option<i32>,
}
impl ShoppingListItemRecord {
    pub fn from_domain(list_id: Uuid, position: usize, item: &ShoppingListItem) -> Self {
        let product = item.product.as_ref();
        Self {
            id: item.id,
            list_id,
            position: i32::try_from(position).unwrap_or(i32::MAX),
            text: item.text.clone(),
            category: item.category.to_string(),
            product_id: product.map(|p| p.id.clone()),
            product_name: product.map(|p| p.name.clone()),
            product_price: product.map(|p| p.price),
            product_image: product.map(|p| p.image.clone()),
            product_store: product.map(|p| p.store.to_string()),
            quantity: i32::try_from(item.quantity()).ok(),
        }
    }

    /// Rebuilds the item, filling defaults for anything the row lacks.
    pub fn to_domain(self) -> ShoppingListItem {
        let category: ProductCategory = self.category.parse().unwrap_or_else(|_| {
            warn!(item_id = %self.id, category = %self.category, "Unknown stored category");
            Default::default()
        });
        let product = self.product_id.map(|id| Product {
            id,
            name: self.product_name.unwrap_or_default(),
            description: String::new(),
            price: self.product_price.unwrap_or(0.0),
            image: self.product_image.unwrap_or_default(),
            category,
            store: self
                .product_store
                .and_then(|s| s.parse().ok())
                .unwrap_or(Store::Walmart),
            in_stock: true,
        });
        let quantity = self
            .quantity
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(1);
        ShoppingListItem::settled(self.id, self.text, category, product, quantity)
    }
}

#[derive(FromRow, Clone, Debug)]
pub(crate) struct UserPreferencesRecord {
    pub id: Uuid,
    pub preferred_store: String,
    pub organic: bool,
    pub gluten_free: bool,
    pub dairy_free: bool,
    pub vegan: bool,
    pub price_preference: String,
}
impl UserPreferencesRecord {
    pub fn from_domain(user_id: Uuid, preferences: &UserPreferences) -> Self {
        Self {
            id: user_id,
            preferred_store: preferences.preferred_store.as_str().to_string(),
            organic: preferences.dietary.organic,
            gluten_free: preferences.dietary.gluten_free,
            dairy_free: preferences.dietary.dairy_free,
            vegan: preferences.dietary.vegan,
            price_preference: preferences.price_preference.as_str().to_string(),
        }
    }

    pub fn to_domain(self) -> UserPreferences {
        UserPreferences {
            preferred_store: self
                .preferred_store
                .parse()
                .unwrap_or(StorePreference::NoPreference),
            dietary: DietaryRestrictions {
                organic: self.organic,
                gluten_free: self.gluten_free,
                dairy_free: self.dairy_free,
                vegan: self.vegan,
            },
            price_preference: self.price_preference.parse().unwrap_or_default(),
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: Option<&str>,
    ) -> PortResult<AuthUser> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, display_name, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING user_id, email, display_name, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(display_name)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::InvalidInput(format!("Email {} is already registered", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, display_name, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", email)))?;
        Ok(record.to_credentials())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<AuthUser> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, display_name, hashed_password FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_shopping_list(&self, user_id: Uuid, name: &str) -> PortResult<ShoppingList> {
        let record = sqlx::query_as::<_, ShoppingListRecord>(
            "INSERT INTO shopping_lists (user_id, name) VALUES ($1, $2) \
             RETURNING id, user_id, name, created_at, updated_at",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_shopping_list(&self, list_id: Uuid) -> PortResult<ShoppingList> {
        let record = sqlx::query_as::<_, ShoppingListRecord>(
            "SELECT id, user_id, name, created_at, updated_at FROM shopping_lists WHERE id = $1",
        )
        .bind(list_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Shopping list {} not found", list_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_shopping_lists(&self, user_id: Uuid) -> PortResult<Vec<ShoppingList>> {
        let records = sqlx::query_as::<_, ShoppingListRecord>(
            "SELECT id, user_id, name, created_at, updated_at FROM shopping_lists \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_shopping_list(&self, list_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM shopping_lists WHERE id = $1")
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn save_shopping_list_items(
        &self,
        list_id: Uuid,
        items: &[ShoppingListItem],
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        for (position, item) in items.iter().enumerate() {
            let r = ShoppingListItemRecord::from_domain(list_id, position, item);
            sqlx::query(
                "INSERT INTO shopping_list_items \
                 (id, list_id, position, text, category, product_id, product_name, product_price, product_image, product_store, quantity) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
                 ON CONFLICT (id) DO UPDATE SET \
                 position = EXCLUDED.position, text = EXCLUDED.text, category = EXCLUDED.category, \
                 product_id = EXCLUDED.product_id, product_name = EXCLUDED.product_name, \
                 product_price = EXCLUDED.product_price, product_image = EXCLUDED.product_image, \
                 product_store = EXCLUDED.product_store, quantity = EXCLUDED.quantity",
            )
            .bind(r.id)
            .bind(r.list_id)
            .bind(r.position)
            .bind(r.text)
            .bind(r.category)
            .bind(r.product_id)
            .bind(r.product_name)
            .bind(r.product_price)
            .bind(r.product_image)
            .bind(r.product_store)
            .bind(r.quantity)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        sqlx::query("UPDATE shopping_lists SET updated_at = NOW() WHERE id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn fetch_shopping_list_items(&self, list_id: Uuid) -> PortResult<Vec<ShoppingListItem>> {
        let records = sqlx::query_as::<_, ShoppingListItemRecord>(
            "SELECT id, list_id, position, text, category, product_id, product_name, product_price, \
             product_image, product_store, quantity FROM shopping_list_items \
             WHERE list_id = $1 ORDER BY position ASC, created_at ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn fetch_user_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>> {
        let record = sqlx::query_as::<_, UserPreferencesRecord>(
            "SELECT id, preferred_store, organic, gluten_free, dairy_free, vegan, price_preference \
             FROM user_preferences WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn save_user_preferences(
        &self,
        user_id: Uuid,
        preferences: &UserPreferences,
    ) -> PortResult<()> {
        let r = UserPreferencesRecord::from_domain(user_id, preferences);
        sqlx::query(
            "INSERT INTO user_preferences \
             (id, preferred_store, organic, gluten_free, dairy_free, vegan, price_preference) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
             preferred_store = EXCLUDED.preferred_store, organic = EXCLUDED.organic, \
             gluten_free = EXCLUDED.gluten_free, dairy_free = EXCLUDED.dairy_free, \
             vegan = EXCLUDED.vegan, price_preference = EXCLUDED.price_preference",
        )
        .bind(r.id)
        .bind(r.preferred_store)
        .bind(r.organic)
        .bind(r.gluten_free)
        .bind(r.dairy_free)
        .bind(r.vegan)
        .bind(r.price_preference)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}
