//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use shopping_list_core::domain::AuthUser;
use shopping_list_core::ports::{CheckoutService, DatabaseService, KeyValueStore};
use shopping_list_core::{Cart, ListProcessor, ProductCatalog, RuleBasedClassifier};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub processor: Arc<ListProcessor>,
    /// Answers the public `/categorize` function.
    pub rules: RuleBasedClassifier,
    pub token_store: Arc<dyn KeyValueStore>,
    pub checkout: Arc<dyn CheckoutService>,
}

impl AppState {
    pub fn catalog(&self) -> &ProductCatalog {
        self.processor.matcher().catalog()
    }
}

//=========================================================================================
// SessionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active WebSocket connection.
pub struct SessionState {
    pub user: AuthUser,
    pub cart: Cart,
}

impl SessionState {
    pub fn new(app_state: &AppState, user: AuthUser) -> Self {
        let cart = Cart::new(user.id, app_state.db.clone());
        Self { user, cart }
    }
}
