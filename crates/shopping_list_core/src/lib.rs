pub mod cart;
pub mod catalog;
pub mod classifier;
pub mod domain;
pub mod matcher;
pub mod ports;
pub mod processor;

pub use cart::{Cart, CartError, QuantityChange};
pub use catalog::ProductCatalog;
pub use classifier::{
    CategoryClassifier, Classification, ClassifierMode, RemoteClassifier, RuleBasedClassifier,
};
pub use domain::{
    AuthUser, CheckoutReceipt, DietaryRestrictions, Notification, NotificationLevel,
    PricePreference, Product, ProductCategory, ShoppingList, ShoppingListItem, Store,
    StorePreference, UserCredentials, UserPreferences, MAX_QUANTITY,
};
pub use matcher::ProductMatcher;
pub use ports::{
    CheckoutService, DatabaseService, KeyValueStore, LabelScore, Notifier, PortError, PortResult,
    TextClassificationService,
};
pub use processor::ListProcessor;
