//! crates/shopping_list_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Categories and Stores
//=========================================================================================

/// The fixed product taxonomy. `Uncategorized` is the single fallback label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProductCategory {
    Dairy,
    Produce,
    CleaningSupplies,
    Pantry,
    Beverages,
    HealthAndBeauty,
    Household,
    Electronics,
    #[default]
    Uncategorized,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 9] = [
        ProductCategory::Dairy,
        ProductCategory::Produce,
        ProductCategory::CleaningSupplies,
        ProductCategory::Pantry,
        ProductCategory::Beverages,
        ProductCategory::HealthAndBeauty,
        ProductCategory::Household,
        ProductCategory::Electronics,
        ProductCategory::Uncategorized,
    ];

    /// The display label, which is also the persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Dairy => "Dairy",
            ProductCategory::Produce => "Produce",
            ProductCategory::CleaningSupplies => "Cleaning Supplies",
            ProductCategory::Pantry => "Pantry",
            ProductCategory::Beverages => "Beverages",
            ProductCategory::HealthAndBeauty => "Health and Beauty",
            ProductCategory::Household => "Household",
            ProductCategory::Electronics => "Electronics",
            ProductCategory::Uncategorized => "Uncategorized",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown product category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for ProductCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ProductCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// The two mock stores a cart can be checked out against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Store {
    Walmart,
    Instacart,
}

impl Store {
    pub fn as_str(&self) -> &'static str {
        match self {
            Store::Walmart => "Walmart",
            Store::Instacart => "Instacart",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown store: {0}")]
pub struct ParseStoreError(pub String);

impl FromStr for Store {
    type Err = ParseStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walmart" => Ok(Store::Walmart),
            "instacart" => Ok(Store::Instacart),
            _ => Err(ParseStoreError(s.to_string())),
        }
    }
}

//=========================================================================================
// Catalog and List Items
//=========================================================================================

/// An immutable catalog record.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub category: ProductCategory,
    pub store: Store,
    pub in_stock: bool,
}

/// Largest quantity a single item may carry.
pub const MAX_QUANTITY: u32 = 9_999;

/// The unit of work: one line of the user's list and what it resolved to.
///
/// `quantity` is private so that it always stays within `1..=MAX_QUANTITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub text: String,
    pub category: ProductCategory,
    pub product: Option<Product>,
    quantity: u32,
    pub is_processing: bool,
}

impl ShoppingListItem {
    /// A freshly created item that has not been classified yet.
    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            category: ProductCategory::Uncategorized,
            product: None,
            quantity: 1,
            is_processing: true,
        }
    }

    /// Rebuilds a settled item, e.g. when loading from storage.
    /// Out-of-range quantities are clamped into `1..=MAX_QUANTITY`.
    pub fn settled(
        id: Uuid,
        text: impl Into<String>,
        category: ProductCategory,
        product: Option<Product>,
        quantity: u32,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            category,
            product,
            quantity: quantity.clamp(1, MAX_QUANTITY),
            is_processing: false,
        }
    }

    /// Settles this item with the outcome of classification and matching.
    pub fn settle(mut self, category: ProductCategory, product: Option<Product>) -> Self {
        self.category = category;
        self.product = product;
        self.is_processing = false;
        self
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Replaces the quantity. Returns `false` and leaves the item untouched
    /// when `quantity` is outside `1..=MAX_QUANTITY`.
    pub fn set_quantity(&mut self, quantity: u32) -> bool {
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return false;
        }
        self.quantity = quantity;
        true
    }

    /// Price of the attached product times the quantity, if any product is attached.
    pub fn line_total(&self) -> Option<f64> {
        self.product
            .as_ref()
            .map(|p| p.price * f64::from(self.quantity))
    }
}

/// A named collection of items owned by one user.
#[derive(Debug, Clone)]
pub struct ShoppingList {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_LIST_NAME: &str = "Shopping List";

//=========================================================================================
// Users and Preferences
//=========================================================================================

/// The logged-in user's identity as seen by the rest of the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

impl AuthUser {
    /// Uses `name` when given, otherwise the local part of the email.
    pub fn new(id: Uuid, email: impl Into<String>, name: Option<&str>) -> Self {
        let email = email.into();
        let display_name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => email.split('@').next().unwrap_or_default().to_string(),
        };
        Self {
            id,
            email,
            display_name,
        }
    }
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: AuthUser,
    pub hashed_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorePreference {
    Store(Store),
    #[default]
    NoPreference,
}

impl StorePreference {
    pub fn as_store(&self) -> Option<Store> {
        match self {
            StorePreference::Store(s) => Some(*s),
            StorePreference::NoPreference => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorePreference::Store(s) => s.as_str(),
            StorePreference::NoPreference => "No Preference",
        }
    }
}

impl FromStr for StorePreference {
    type Err = ParseStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("no preference") {
            return Ok(StorePreference::NoPreference);
        }
        s.parse().map(StorePreference::Store)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DietaryRestrictions {
    pub organic: bool,
    pub gluten_free: bool,
    pub dairy_free: bool,
    pub vegan: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricePreference {
    #[default]
    Lowest,
    MidRange,
    Premium,
}

impl PricePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricePreference::Lowest => "lowest",
            PricePreference::MidRange => "mid-range",
            PricePreference::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown price preference: {0}")]
pub struct ParsePricePreferenceError(pub String);

impl FromStr for PricePreference {
    type Err = ParsePricePreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowest" => Ok(PricePreference::Lowest),
            "mid-range" => Ok(PricePreference::MidRange),
            "premium" => Ok(PricePreference::Premium),
            _ => Err(ParsePricePreferenceError(s.to_string())),
        }
    }
}

/// Per-user settings. Only `preferred_store` feeds into matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserPreferences {
    pub preferred_store: StorePreference,
    pub dietary: DietaryRestrictions,
    pub price_preference: PricePreference,
}

//=========================================================================================
// Notifications and Checkout
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A non-blocking, user-visible message (the client renders it as a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Confirmation of a completed (simulated) order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub order_id: Uuid,
    pub store: Store,
    pub item_count: u32,
    pub total: f64,
}
