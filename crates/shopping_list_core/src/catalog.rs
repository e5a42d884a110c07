//! crates/shopping_list_core/src/catalog.rs
//!
//! The fixed, in-memory product catalog. Seeded once at startup and never
//! mutated afterwards.

use crate::domain::{Product, ProductCategory, Store};

/// (id, name, description, price, image, category, store)
type Seed = (
    &'static str,
    &'static str,
    &'static str,
    f64,
    &'static str,
    ProductCategory,
    Store,
);

const SEED: &[Seed] = &[
    ("p1", "Organic Whole Milk", "1 Gallon, Grade A, Pasteurized", 4.99, "https://i.imgur.com/JgzrFgH.jpg", ProductCategory::Dairy, Store::Walmart),
    ("p2", "Large Brown Eggs", "12 count, Grade A, Free Range", 3.49, "https://i.imgur.com/YtY24Ys.jpg", ProductCategory::Dairy, Store::Instacart),
    ("p3", "Organic Bananas", "Bunch, Approximately 5-7", 1.99, "https://i.imgur.com/OuPA1h5.jpg", ProductCategory::Produce, Store::Walmart),
    ("p4", "Red Delicious Apples", "3 lb Bag", 4.49, "https://i.imgur.com/vytmuFP.jpg", ProductCategory::Produce, Store::Instacart),
    ("p5", "All-Purpose Cleaner", "32 oz Spray Bottle", 3.99, "https://i.imgur.com/fMXtCxv.jpg", ProductCategory::CleaningSupplies, Store::Walmart),
    ("p6", "Paper Towels", "6 Roll Pack, Select-A-Size", 8.99, "https://i.imgur.com/T0qUimb.jpg", ProductCategory::Household, Store::Instacart),
    ("p7", "White Rice", "5 lb Bag, Long Grain", 4.29, "https://i.imgur.com/b2vOOYF.jpg", ProductCategory::Pantry, Store::Walmart),
    ("p8", "Pasta Sauce", "24 oz Jar, Traditional", 2.79, "https://i.imgur.com/XyoYcBC.jpg", ProductCategory::Pantry, Store::Instacart),
    ("p9", "Coffee", "12 oz Bag, Medium Roast, Ground", 7.99, "https://i.imgur.com/USoYfLn.jpg", ProductCategory::Beverages, Store::Walmart),
    ("p10", "Orange Juice", "59 oz Carton, Pulp Free", 3.49, "https://i.imgur.com/4FrXsWO.jpg", ProductCategory::Beverages, Store::Instacart),
    ("p11", "Shampoo", "16 oz Bottle, For All Hair Types", 5.99, "https://i.imgur.com/5hf5B2m.jpg", ProductCategory::HealthAndBeauty, Store::Walmart),
    ("p12", "Toothpaste", "6 oz Tube, Mint Flavor", 2.99, "https://i.imgur.com/RBqfb8k.jpg", ProductCategory::HealthAndBeauty, Store::Instacart),
    ("p13", "Laundry Detergent", "100 oz Bottle, HE Compatible", 11.99, "https://i.imgur.com/FD8VHnL.jpg", ProductCategory::Household, Store::Walmart),
    ("p14", "Trash Bags", "45 Count, 13 Gallon", 8.49, "https://i.imgur.com/EA4JO6r.jpg", ProductCategory::Household, Store::Instacart),
    ("p15", "HDMI Cable", "6 ft, 4K Compatible", 9.99, "https://i.imgur.com/F8BRqAm.jpg", ProductCategory::Electronics, Store::Walmart),
];

#[derive(Debug, Clone)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Builds a catalog from arbitrary products. Order is preserved and is the
    /// order matching results come back in.
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The built-in catalog the service starts with.
    pub fn seeded() -> Self {
        let products = SEED
            .iter()
            .map(|&(id, name, description, price, image, category, store)| Product {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                price,
                image: image.to_string(),
                category,
                store,
                in_stock: true,
            })
            .collect();
        Self::new(products)
    }

    pub fn all(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn by_category(&self, category: ProductCategory) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| p.category == category)
    }

    pub fn by_store(&self, store: Store) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| p.store == store)
    }
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::seeded()
    }
}
