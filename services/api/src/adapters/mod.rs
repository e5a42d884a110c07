pub mod checkout;
pub mod classifier_http;
pub mod db;
pub mod memory;
pub mod token_store;

pub use checkout::SimulatedCheckout;
pub use classifier_http::HttpClassifierAdapter;
pub use db::DbAdapter;
pub use memory::InMemoryDb;
pub use token_store::{FileTokenStore, MemoryTokenStore};
