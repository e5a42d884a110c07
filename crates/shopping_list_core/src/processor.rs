//! crates/shopping_list_core/src/processor.rs
//!
//! Turns raw list text into settled shopping list items.
//!
//! Items are handled strictly one after another so that the updates a caller
//! observes through `on_update` arrive in input order.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::classifier::CategoryClassifier;
use crate::domain::{Notification, ShoppingListItem, Store};
use crate::matcher::ProductMatcher;
use crate::ports::Notifier;

/// Splits on commas and newlines, trims, and drops empty tokens.
/// Duplicates are kept as independent items.
pub fn split_items(list_text: &str) -> Vec<&str> {
    list_text
        .split(|c: char| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

pub struct ListProcessor {
    classifier: Arc<dyn CategoryClassifier>,
    matcher: ProductMatcher,
}

impl ListProcessor {
    pub fn new(classifier: Arc<dyn CategoryClassifier>, matcher: ProductMatcher) -> Self {
        Self {
            classifier,
            matcher,
        }
    }

    pub fn matcher(&self) -> &ProductMatcher {
        &self.matcher
    }

    /// Processes every item of `list_text`.
    ///
    /// `on_update` sees each item twice: once pending, once settled. Returns the
    /// settled items in input order. `user_id` selects that user's classifier
    /// settings.
    pub async fn process<F>(
        &self,
        list_text: &str,
        preferred_store: Option<Store>,
        user_id: Option<Uuid>,
        notifier: &dyn Notifier,
        mut on_update: F,
    ) -> Vec<ShoppingListItem>
    where
        F: FnMut(&ShoppingListItem),
    {
        let tokens = split_items(list_text);
        if tokens.is_empty() {
            notifier.notify(Notification::warning(
                "Empty list",
                "Please enter at least one item.",
            ));
            return Vec::new();
        }

        info!(count = tokens.len(), "Processing shopping list");
        let mut settled = Vec::with_capacity(tokens.len());

        for text in tokens {
            let pending = ShoppingListItem::pending(text);
            on_update(&pending);

            let classification = self.classifier.classify_for(text, user_id).await;
            if let Some(reason) = &classification.degraded {
                warn!(item_id = %pending.id, text, reason = %reason, "Item classified by fallback");
                notifier.notify(Notification::warning(
                    "Classification failed",
                    format!("Could not classify \"{text}\" remotely: {reason}"),
                ));
            }

            let product = self
                .matcher
                .find_matches(text, classification.category, preferred_store)
                .into_iter()
                .next();

            let item = pending.settle(classification.category, product);
            on_update(&item);
            settled.push(item);
        }

        notifier.notify(Notification::info(
            "Shopping list processed",
            "We've found matching products for your items.",
        ));
        settled
    }
}
