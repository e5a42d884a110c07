//! services/api/src/web/dto.rs
//!
//! JSON shapes shared by the REST endpoints and the WebSocket protocol, and
//! their conversions to and from the core domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopping_list_core::domain::{
    AuthUser, CheckoutReceipt, DietaryRestrictions, Notification, NotificationLevel, Product,
    ShoppingList, ShoppingListItem, UserPreferences,
};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub category: String,
    pub store: String,
    pub in_stock: bool,
}

impl From<&Product> for ProductDto {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            image: p.image.clone(),
            category: p.category.to_string(),
            store: p.store.to_string(),
            in_stock: p.in_stock,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ItemDto {
    pub id: Uuid,
    pub text: String,
    pub category: String,
    pub product: Option<ProductDto>,
    pub quantity: u32,
    pub is_processing: bool,
}

impl From<&ShoppingListItem> for ItemDto {
    fn from(item: &ShoppingListItem) -> Self {
        Self {
            id: item.id,
            text: item.text.clone(),
            category: item.category.to_string(),
            product: item.product.as_ref().map(ProductDto::from),
            quantity: item.quantity(),
            is_processing: item.is_processing,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ShoppingListDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShoppingList> for ShoppingListDto {
    fn from(list: ShoppingList) -> Self {
        Self {
            id: list.id,
            user_id: list.user_id,
            name: list.name,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<AuthUser> for UserDto {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.display_name,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevelDto {
    Info,
    Warning,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct NotificationDto {
    pub level: NotificationLevelDto,
    pub title: String,
    pub message: String,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        let level = match n.level {
            NotificationLevel::Info => NotificationLevelDto::Info,
            NotificationLevel::Warning => NotificationLevelDto::Warning,
            NotificationLevel::Error => NotificationLevelDto::Error,
        };
        Self {
            level,
            title: n.title,
            message: n.message,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ReceiptDto {
    pub order_id: Uuid,
    pub store: String,
    pub item_count: u32,
    pub total: f64,
}

impl From<CheckoutReceipt> for ReceiptDto {
    fn from(r: CheckoutReceipt) -> Self {
        Self {
            order_id: r.order_id,
            store: r.store.to_string(),
            item_count: r.item_count,
            total: r.total,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ToSchema)]
pub struct DietaryRestrictionsDto {
    #[serde(default)]
    pub organic: bool,
    #[serde(default)]
    pub gluten_free: bool,
    #[serde(default)]
    pub dairy_free: bool,
    #[serde(default)]
    pub vegan: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct PreferencesDto {
    /// "Walmart", "Instacart" or "No Preference".
    pub preferred_store: String,
    #[serde(default)]
    pub dietary_restrictions: DietaryRestrictionsDto,
    /// "lowest", "mid-range" or "premium".
    pub price_preference: String,
}

impl From<UserPreferences> for PreferencesDto {
    fn from(p: UserPreferences) -> Self {
        Self {
            preferred_store: p.preferred_store.as_str().to_string(),
            dietary_restrictions: DietaryRestrictionsDto {
                organic: p.dietary.organic,
                gluten_free: p.dietary.gluten_free,
                dairy_free: p.dietary.dairy_free,
                vegan: p.dietary.vegan,
            },
            price_preference: p.price_preference.as_str().to_string(),
        }
    }
}

impl TryFrom<PreferencesDto> for UserPreferences {
    type Error = String;

    fn try_from(dto: PreferencesDto) -> Result<Self, Self::Error> {
        let d = dto.dietary_restrictions;
        Ok(Self {
            preferred_store: dto.preferred_store.parse().map_err(|e| format!("{e}"))?,
            dietary: DietaryRestrictions {
                organic: d.organic,
                gluten_free: d.gluten_free,
                dairy_free: d.dairy_free,
                vegan: d.vegan,
            },
            price_preference: dto.price_preference.parse().map_err(|e| format!("{e}"))?,
        })
    }
}
