//! crates/shopping_list_core/src/matcher.rs
//!
//! Selects candidate catalog products for a piece of item text within a single
//! category. Results come back in catalog order; the first one is the match.

use std::sync::Arc;

use crate::catalog::ProductCatalog;
use crate::domain::{Product, ProductCategory, ShoppingListItem, Store};

#[derive(Debug, Clone)]
pub struct ProductMatcher {
    catalog: Arc<ProductCatalog>,
}

impl ProductMatcher {
    pub fn new(catalog: Arc<ProductCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// Products in `category` whose name or description contains `text`.
    ///
    /// With no textual hit the whole category is returned instead. A preferred
    /// store narrows the result only if that store has at least one candidate.
    pub fn find_matches(
        &self,
        text: &str,
        category: ProductCategory,
        preferred_store: Option<Store>,
    ) -> Vec<Product> {
        let needle = text.trim().to_lowercase();

        let mut matches: Vec<&Product> = self
            .catalog
            .by_category(category)
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .collect();

        if matches.is_empty() {
            matches = self.catalog.by_category(category).collect();
        }

        if let Some(store) = preferred_store {
            let in_store: Vec<&Product> =
                matches.iter().copied().filter(|p| p.store == store).collect();
            if !in_store.is_empty() {
                matches = in_store;
            }
        }

        matches.into_iter().cloned().collect()
    }

    /// Other products the user could swap in for `item`'s current match.
    pub fn alternatives(&self, item: &ShoppingListItem) -> Vec<Product> {
        let current = item.product.as_ref().map(|p| p.id.as_str());
        self.catalog
            .by_category(item.category)
            .filter(|p| Some(p.id.as_str()) != current)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> ProductMatcher {
        ProductMatcher::new(Arc::new(ProductCatalog::seeded()))
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn text_hit_within_category() {
        let found = matcher().find_matches("Rice", ProductCategory::Pantry, None);
        assert_eq!(ids(&found), vec!["p7"]);
    }

    #[test]
    fn description_is_searched_too() {
        let found = matcher().find_matches("free range", ProductCategory::Dairy, None);
        assert_eq!(ids(&found), vec!["p2"]);
    }

    #[test]
    fn no_text_hit_widens_to_whole_category() {
        let found = matcher().find_matches("butter", ProductCategory::Dairy, None);
        assert_eq!(ids(&found), vec!["p1", "p2"]);
    }

    #[test]
    fn text_hit_outside_category_is_ignored() {
        // "Coffee" exists, but not as a dairy product.
        let found = matcher().find_matches("coffee", ProductCategory::Dairy, None);
        assert!(found.iter().all(|p| p.category == ProductCategory::Dairy));
    }

    #[test]
    fn preferred_store_narrows_when_possible() {
        let m = matcher();
        let found = m.find_matches("milk", ProductCategory::Dairy, Some(Store::Instacart));
        // "milk" only hits p1 (Walmart), so the preference cannot narrow it.
        assert_eq!(ids(&found), vec!["p1"]);

        let found = m.find_matches("butter", ProductCategory::Dairy, Some(Store::Instacart));
        assert_eq!(ids(&found), vec!["p2"]);
    }

    #[test]
    fn uncategorized_has_no_candidates() {
        assert!(matcher()
            .find_matches("widgets", ProductCategory::Uncategorized, Some(Store::Walmart))
            .is_empty());
    }

    #[test]
    fn alternatives_exclude_current_product() {
        let m = matcher();
        let current = m.catalog().get("p6").cloned();
        let item = ShoppingListItem::pending("paper towels").settle(ProductCategory::Household, current);
        assert_eq!(ids(&m.alternatives(&item)), vec!["p13", "p14"]);
    }
}
