//! services/api/src/adapters/checkout.rs
//!
//! A stand-in for the two stores' ordering APIs. It waits for a configured
//! delay and then accepts any non-empty cart in full.

use async_trait::async_trait;
use shopping_list_core::domain::{CheckoutReceipt, ShoppingListItem, Store};
use shopping_list_core::ports::{CheckoutService, PortError, PortResult};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct SimulatedCheckout {
    delay: Duration,
}

impl SimulatedCheckout {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CheckoutService for SimulatedCheckout {
    async fn checkout(
        &self,
        items: &[ShoppingListItem],
        store: Store,
    ) -> PortResult<CheckoutReceipt> {
        if items.is_empty() {
            return Err(PortError::InvalidInput("The cart is empty".to_string()));
        }

        let item_count = items
            .iter()
            .try_fold(0u32, |count, item| count.checked_add(item.quantity()))
            .ok_or_else(|| PortError::InvalidInput("Too many items in the cart".to_string()))?;

        tokio::time::sleep(self.delay).await;

        let receipt = CheckoutReceipt {
            order_id: Uuid::new_v4(),
            store,
            item_count,
            total: items.iter().filter_map(ShoppingListItem::line_total).sum(),
        };
        info!(order_id = %receipt.order_id, store = %store, total = receipt.total, "Order placed");
        Ok(receipt)
    }
}
