//! crates/shopping_list_core/src/cart.rs
//!
//! The authoritative in-memory state of the active shopping list.
//!
//! Every user edit is applied locally first. If the cart is attached to a
//! persisted list, a full upsert of the settled items is then spawned in the
//! background; its failure is only logged and never rolls the edit back.
//! Concurrent saves are not coalesced, so whichever lands last wins.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Product, ShoppingListItem};
use crate::ports::DatabaseService;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("No item with id {0} in the cart")]
    ItemNotFound(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated,
    /// The requested quantity was outside `1..=MAX_QUANTITY` and was ignored.
    Unchanged,
}

pub struct Cart {
    user_id: Uuid,
    list_id: Option<Uuid>,
    items: Vec<ShoppingListItem>,
    db: Arc<dyn DatabaseService>,
}

impl Cart {
    pub fn new(user_id: Uuid, db: Arc<dyn DatabaseService>) -> Self {
        Self {
            user_id,
            list_id: None,
            items: Vec::new(),
            db,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn list_id(&self) -> Option<Uuid> {
        self.list_id
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ShoppingListItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Sum of price times quantity over items that have a product.
    pub fn total(&self) -> f64 {
        self.items.iter().filter_map(ShoppingListItem::line_total).sum()
    }

    /// Binds the cart to a persisted list so later edits get saved.
    pub fn attach_list(&mut self, list_id: Uuid) {
        self.list_id = Some(list_id);
    }

    /// Replaces the whole cart with a previously persisted list.
    pub fn load(&mut self, list_id: Uuid, items: Vec<ShoppingListItem>) {
        self.list_id = Some(list_id);
        self.items = items;
    }

    /// Inserts or replaces an item coming out of the list processor.
    ///
    /// A settled item is never put back into the processing state; such an
    /// update is dropped and `false` returned.
    pub fn apply_update(&mut self, item: ShoppingListItem) -> bool {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) if !existing.is_processing && item.is_processing => {
                debug!(item_id = %item.id, "Ignoring stale processing update");
                false
            }
            Some(existing) => {
                *existing = item;
                true
            }
            None => {
                self.items.push(item);
                true
            }
        }
    }

    /// Sets the quantity as typed by the user. Zero, negative and oversized
    /// values leave the item alone.
    pub fn update_quantity(&mut self, id: Uuid, quantity: i64) -> Result<QuantityChange, CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(CartError::ItemNotFound(id))?;

        let accepted = u32::try_from(quantity).is_ok_and(|q| item.set_quantity(q));
        if !accepted {
            return Ok(QuantityChange::Unchanged);
        }
        self.persist_in_background();
        Ok(QuantityChange::Updated)
    }

    /// Swaps in `product` for the item. The product's category is not checked
    /// against the item's.
    pub fn select_alternative(&mut self, id: Uuid, product: Product) -> Result<(), CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(CartError::ItemNotFound(id))?;
        item.product = Some(product);
        self.persist_in_background();
        Ok(())
    }

    /// Clears everything and detaches from the persisted list. Saves already
    /// in flight are left to finish.
    pub fn reset(&mut self) {
        self.items.clear();
        self.list_id = None;
    }

    /// Spawns a full upsert of the current settled items. Returns `None` when
    /// the cart has no persisted list to write to.
    pub fn persist_in_background(&self) -> Option<JoinHandle<()>> {
        let list_id = self.list_id?;
        let items: Vec<ShoppingListItem> = self
            .items
            .iter()
            .filter(|i| !i.is_processing)
            .cloned()
            .collect();
        let db = self.db.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = db.save_shopping_list_items(list_id, &items).await {
                warn!(list_id = %list_id, error = %e, "Background save of shopping list failed");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductCatalog;
    use crate::domain::{
        AuthUser, ProductCategory, ShoppingList, UserCredentials, UserPreferences, MAX_QUANTITY,
    };
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    /// Records item saves; every other call is unused by the cart.
    #[derive(Default)]
    struct SaveLog {
        saves: Mutex<Vec<(Uuid, Vec<ShoppingListItem>)>>,
        fail: bool,
    }

    fn unused<T>() -> PortResult<T> {
        Err(PortError::Unexpected("not used by the cart".to_string()))
    }

    #[async_trait]
    impl DatabaseService for SaveLog {
        async fn create_user_with_email(&self, _: &str, _: &str, _: Option<&str>) -> PortResult<AuthUser> {
            unused()
        }
        async fn get_user_by_email(&self, _: &str) -> PortResult<UserCredentials> {
            unused()
        }
        async fn get_user_by_id(&self, _: Uuid) -> PortResult<AuthUser> {
            unused()
        }
        async fn create_auth_session(&self, _: &str, _: Uuid, _: DateTime<Utc>) -> PortResult<()> {
            unused()
        }
        async fn validate_auth_session(&self, _: &str) -> PortResult<Uuid> {
            unused()
        }
        async fn delete_auth_session(&self, _: &str) -> PortResult<()> {
            unused()
        }
        async fn create_shopping_list(&self, _: Uuid, _: &str) -> PortResult<ShoppingList> {
            unused()
        }
        async fn get_shopping_list(&self, _: Uuid) -> PortResult<ShoppingList> {
            unused()
        }
        async fn get_user_shopping_lists(&self, _: Uuid) -> PortResult<Vec<ShoppingList>> {
            unused()
        }
        async fn delete_shopping_list(&self, _: Uuid) -> PortResult<()> {
            unused()
        }
        async fn save_shopping_list_items(&self, list_id: Uuid, items: &[ShoppingListItem]) -> PortResult<()> {
            self.saves.lock().unwrap().push((list_id, items.to_vec()));
            if self.fail {
                return Err(PortError::Unexpected("connection reset".to_string()));
            }
            Ok(())
        }
        async fn fetch_shopping_list_items(&self, _: Uuid) -> PortResult<Vec<ShoppingListItem>> {
            unused()
        }
        async fn fetch_user_preferences(&self, _: Uuid) -> PortResult<Option<UserPreferences>> {
            unused()
        }
        async fn save_user_preferences(&self, _: Uuid, _: &UserPreferences) -> PortResult<()> {
            unused()
        }
    }

    fn settled(text: &str, category: ProductCategory, product_id: &str) -> ShoppingListItem {
        let product = ProductCatalog::seeded().get(product_id).cloned();
        ShoppingListItem::pending(text).settle(category, product)
    }

    fn cart_with(log: Arc<SaveLog>, items: Vec<ShoppingListItem>) -> Cart {
        let mut cart = Cart::new(Uuid::new_v4(), log);
        cart.load(Uuid::new_v4(), items);
        cart
    }

    #[tokio::test]
    async fn decrement_below_one_is_ignored_without_saving() {
        let log = Arc::new(SaveLog::default());
        let item = settled("milk", ProductCategory::Dairy, "p1");
        let id = item.id;
        let mut cart = cart_with(log.clone(), vec![item]);

        assert_eq!(cart.update_quantity(id, 0), Ok(QuantityChange::Unchanged));
        assert_eq!(cart.update_quantity(id, -1), Ok(QuantityChange::Unchanged));
        assert_eq!(cart.get(id).unwrap().quantity(), 1);
        tokio::task::yield_now().await;
        assert!(log.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_quantity_is_ignored_without_saving() {
        let log = Arc::new(SaveLog::default());
        let item = settled("milk", ProductCategory::Dairy, "p1");
        let id = item.id;
        let mut cart = cart_with(log.clone(), vec![item]);

        assert_eq!(cart.update_quantity(id, 3_000_000_000), Ok(QuantityChange::Unchanged));
        assert_eq!(cart.update_quantity(id, i64::from(u32::MAX) + 1), Ok(QuantityChange::Unchanged));
        assert_eq!(
            cart.update_quantity(id, i64::from(MAX_QUANTITY) + 1),
            Ok(QuantityChange::Unchanged)
        );
        assert_eq!(cart.get(id).unwrap().quantity(), 1);
        tokio::task::yield_now().await;
        assert!(log.saves.lock().unwrap().is_empty());

        assert_eq!(
            cart.update_quantity(id, i64::from(MAX_QUANTITY)),
            Ok(QuantityChange::Updated)
        );
        assert_eq!(cart.get(id).unwrap().quantity(), MAX_QUANTITY);
    }

    #[tokio::test]
    async fn quantity_update_saves_full_cart() {
        let log = Arc::new(SaveLog::default());
        let a = settled("milk", ProductCategory::Dairy, "p1");
        let b = settled("coffee", ProductCategory::Beverages, "p9");
        let id = a.id;
        let mut cart = cart_with(log.clone(), vec![a, b]);
        let list_id = cart.list_id().unwrap();

        assert_eq!(cart.update_quantity(id, 3), Ok(QuantityChange::Updated));
        cart.persist_in_background().unwrap().await.unwrap();

        let saves = log.saves.lock().unwrap();
        assert!(!saves.is_empty());
        let (saved_list, saved_items) = &saves[0];
        assert_eq!(*saved_list, list_id);
        assert_eq!(saved_items.len(), 2);
        assert_eq!(saved_items[0].quantity(), 3);
    }

    #[tokio::test]
    async fn failed_save_keeps_local_change() {
        let log = Arc::new(SaveLog {
            fail: true,
            ..SaveLog::default()
        });
        let item = settled("milk", ProductCategory::Dairy, "p1");
        let id = item.id;
        let mut cart = cart_with(log, vec![item]);

        cart.update_quantity(id, 5).unwrap();
        cart.persist_in_background().unwrap().await.unwrap();
        assert_eq!(cart.get(id).unwrap().quantity(), 5);
    }

    #[tokio::test]
    async fn alternative_from_another_category_is_accepted() {
        let log = Arc::new(SaveLog::default());
        let item = settled("milk", ProductCategory::Dairy, "p1");
        let id = item.id;
        let mut cart = cart_with(log, vec![item]);

        let cable = ProductCatalog::seeded().get("p15").cloned().unwrap();
        cart.select_alternative(id, cable).unwrap();

        let updated = cart.get(id).unwrap();
        assert_eq!(updated.category, ProductCategory::Dairy);
        assert_eq!(updated.product.as_ref().map(|p| p.id.as_str()), Some("p15"));
    }

    #[tokio::test]
    async fn unknown_item_is_an_error() {
        let mut cart = cart_with(Arc::new(SaveLog::default()), vec![]);
        let missing = Uuid::new_v4();
        assert_eq!(cart.update_quantity(missing, 2), Err(CartError::ItemNotFound(missing)));
        let product = ProductCatalog::seeded().get("p1").cloned().unwrap();
        assert_eq!(cart.select_alternative(missing, product), Err(CartError::ItemNotFound(missing)));
    }

    #[tokio::test]
    async fn reset_detaches_and_stops_saving() {
        let log = Arc::new(SaveLog::default());
        let mut cart = cart_with(log, vec![settled("milk", ProductCategory::Dairy, "p1")]);

        cart.reset();
        assert!(cart.is_empty());
        assert_eq!(cart.list_id(), None);
        assert!(cart.persist_in_background().is_none());
    }

    #[test]
    fn settled_item_does_not_return_to_processing() {
        let mut cart = Cart::new(Uuid::new_v4(), Arc::new(SaveLog::default()));
        let pending = ShoppingListItem::pending("milk");
        let done = pending.clone().settle(ProductCategory::Dairy, None);

        assert!(cart.apply_update(pending.clone()));
        assert!(cart.apply_update(done.clone()));
        assert!(!cart.apply_update(pending));
        assert_eq!(cart.items(), &[done]);
    }

    #[test]
    fn total_multiplies_price_by_quantity() {
        let mut cart = Cart::new(Uuid::new_v4(), Arc::new(SaveLog::default()));
        let mut milk = settled("milk", ProductCategory::Dairy, "p1");
        milk.set_quantity(2);
        cart.apply_update(milk);
        cart.apply_update(ShoppingListItem::pending("widget").settle(ProductCategory::Uncategorized, None));

        assert!((cart.total() - 9.98).abs() < 1e-9);
    }
}
