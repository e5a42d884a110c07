//! crates/shopping_list_core/src/classifier.rs
//!
//! Assigns a category to free-text item input.
//!
//! Two interchangeable strategies implement [`CategoryClassifier`]:
//! - [`RuleBasedClassifier`]: ordered keyword rules, first match wins.
//! - [`RemoteClassifier`]: a hosted text-classification model, falling back to
//!   the rules whenever the call cannot produce a recognized label.
//!
//! Neither strategy fails outward. When a fallback was needed the returned
//! [`Classification`] says why, so callers can tell the user.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ProductCategory;
use crate::ports::{KeyValueStore, LabelScore, PortResult, TextClassificationService};

/// Key of the deployment-wide token, seeded from the environment.
pub const TOKEN_KEY: &str = "classifier_token";

/// Key of the token a single user set for their own sessions.
pub fn user_token_key(user_id: Uuid) -> String {
    format!("{TOKEN_KEY}:{user_id}")
}

/// The outcome of classifying one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ProductCategory,
    /// Set when the preferred strategy could not be used and a fallback answered.
    pub degraded: Option<String>,
}

impl Classification {
    pub fn clean(category: ProductCategory) -> Self {
        Self {
            category,
            degraded: None,
        }
    }
}

#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Classification;

    /// Classifies on behalf of `user_id`, using whatever per-user settings the
    /// strategy has. Strategies without any fall through to [`classify`].
    ///
    /// [`classify`]: CategoryClassifier::classify
    async fn classify_for(&self, text: &str, user_id: Option<Uuid>) -> Classification {
        let _ = user_id;
        self.classify(text).await
    }
}

/// Which strategy the service wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    Rules,
    Remote,
}

//=========================================================================================
// Rule-based Strategy
//=========================================================================================

pub type KeywordRule = (ProductCategory, &'static [&'static str]);

/// Rule order matters: a keyword present in two rules resolves to the earlier one.
pub const DEFAULT_RULES: &[KeywordRule] = &[
    (
        ProductCategory::Dairy,
        &["milk", "cheese", "yogurt", "butter", "cream", "egg"],
    ),
    (
        ProductCategory::Produce,
        &[
            "apple", "banana", "orange", "tomato", "potato", "onion", "cucumber", "vegetable",
            "fruit", "carrot", "lettuce",
        ],
    ),
    (
        ProductCategory::CleaningSupplies,
        &["detergent", "soap", "cleaner", "bleach", "wipes"],
    ),
    (
        ProductCategory::Pantry,
        &["pasta", "rice", "cereal", "flour", "sugar", "bread", "oil"],
    ),
    (
        ProductCategory::Beverages,
        &["coffee", "tea", "juice", "soda", "water"],
    ),
    (
        ProductCategory::HealthAndBeauty,
        &["shampoo", "conditioner", "toothpaste", "lotion", "sunscreen", "makeup"],
    ),
    (
        ProductCategory::Household,
        &["towel", "paper", "trash bag", "light bulb", "batteries"],
    ),
    (
        ProductCategory::Electronics,
        &[
            "laptop", "television", "smartphone", "headphones", "tablet", "cable", "phone",
            "charger", "computer", "tv",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct RuleBasedClassifier {
    rules: Vec<KeywordRule>,
}

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }

    pub fn with_rules(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// Pure function of the lower-cased text.
    pub fn categorize(&self, text: &str) -> ProductCategory {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(ProductCategory::Uncategorized)
    }
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CategoryClassifier for RuleBasedClassifier {
    async fn classify(&self, text: &str) -> Classification {
        Classification::clean(self.categorize(text))
    }
}

//=========================================================================================
// Remote Strategy
//=========================================================================================

/// Model vocabulary → fixed taxonomy, by substring containment. First hit wins.
const LABEL_MAP: &[(&str, ProductCategory)] = &[
    ("dairy", ProductCategory::Dairy),
    ("milk", ProductCategory::Dairy),
    ("cheese", ProductCategory::Dairy),
    ("yogurt", ProductCategory::Dairy),
    ("produce", ProductCategory::Produce),
    ("fruit", ProductCategory::Produce),
    ("vegetable", ProductCategory::Produce),
    ("cleaning", ProductCategory::CleaningSupplies),
    ("cleaner", ProductCategory::CleaningSupplies),
    ("detergent", ProductCategory::CleaningSupplies),
    ("pantry", ProductCategory::Pantry),
    ("canned", ProductCategory::Pantry),
    ("pasta", ProductCategory::Pantry),
    ("rice", ProductCategory::Pantry),
    ("beverage", ProductCategory::Beverages),
    ("drink", ProductCategory::Beverages),
    ("health", ProductCategory::HealthAndBeauty),
    ("beauty", ProductCategory::HealthAndBeauty),
    ("personal care", ProductCategory::HealthAndBeauty),
    ("household", ProductCategory::Household),
    ("paper", ProductCategory::Household),
    ("electronics", ProductCategory::Electronics),
    ("gadget", ProductCategory::Electronics),
    ("device", ProductCategory::Electronics),
];

/// Maps a free-form model label onto the taxonomy. Unknown labels give `None`.
pub fn normalize_label(label: &str) -> Option<ProductCategory> {
    let normalized = label.trim().to_lowercase();
    LABEL_MAP
        .iter()
        .find(|(key, _)| normalized.contains(key))
        .map(|(_, category)| *category)
}

/// Picks the highest-confidence label out of a ranked (or unranked) response.
fn top_label(scores: &[LabelScore]) -> Option<&LabelScore> {
    scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

/// Calls a hosted classification model once per item; no retry, no cache.
pub struct RemoteClassifier {
    service: Arc<dyn TextClassificationService>,
    tokens: Arc<dyn KeyValueStore>,
    fallback: RuleBasedClassifier,
}

impl RemoteClassifier {
    pub fn new(
        service: Arc<dyn TextClassificationService>,
        tokens: Arc<dyn KeyValueStore>,
        fallback: RuleBasedClassifier,
    ) -> Self {
        Self {
            service,
            tokens,
            fallback,
        }
    }

    fn fall_back(&self, text: &str, reason: String) -> Classification {
        warn!(reason = %reason, "Remote classification unavailable, using keyword rules");
        Classification {
            category: self.fallback.categorize(text),
            degraded: Some(reason),
        }
    }
}

#[async_trait]
impl CategoryClassifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Classification {
        self.classify_for(text, None).await
    }

    /// A user's own token wins over the deployment-wide one.
    async fn classify_for(&self, text: &str, user_id: Option<Uuid>) -> Classification {
        let stored = match user_id {
            Some(id) => match get_user_token(self.tokens.as_ref(), id).await {
                Ok(None) => get_token(self.tokens.as_ref()).await,
                found => found,
            },
            None => get_token(self.tokens.as_ref()).await,
        };
        let token = match stored {
            Ok(Some(token)) => token,
            Ok(None) => return self.fall_back(text, "API token not set".to_string()),
            Err(e) => return self.fall_back(text, format!("Could not read API token: {e}")),
        };

        let scores = match self.service.classify_text(text, &token).await {
            Ok(scores) => scores,
            Err(e) => return self.fall_back(text, format!("Classifier request failed: {e}")),
        };

        let Some(top) = top_label(&scores) else {
            return self.fall_back(text, "Classifier returned no labels".to_string());
        };

        match normalize_label(&top.label) {
            Some(category) => {
                debug!(label = %top.label, score = top.score, category = %category, "Remote classification");
                Classification::clean(category)
            }
            None => self.fall_back(text, format!("Unrecognized label '{}'", top.label)),
        }
    }
}

//=========================================================================================
// Token Helpers
//=========================================================================================

async fn store_token(store: &dyn KeyValueStore, key: &str, token: &str) -> PortResult<()> {
    let token = token.trim();
    if token.is_empty() {
        store.remove(key).await
    } else {
        store.set(key, token).await
    }
}

async fn load_token(store: &dyn KeyValueStore, key: &str) -> PortResult<Option<String>> {
    Ok(store.get(key).await?.filter(|t| !t.trim().is_empty()))
}

/// Stores the deployment-wide token. A blank token removes it instead.
pub async fn set_token(store: &dyn KeyValueStore, token: &str) -> PortResult<()> {
    store_token(store, TOKEN_KEY, token).await
}

pub async fn get_token(store: &dyn KeyValueStore) -> PortResult<Option<String>> {
    load_token(store, TOKEN_KEY).await
}

pub async fn clear_token(store: &dyn KeyValueStore) -> PortResult<()> {
    store.remove(TOKEN_KEY).await
}

/// Stores `user_id`'s own token. A blank token removes it instead.
pub async fn set_user_token(store: &dyn KeyValueStore, user_id: Uuid, token: &str) -> PortResult<()> {
    store_token(store, &user_token_key(user_id), token).await
}

pub async fn get_user_token(store: &dyn KeyValueStore, user_id: Uuid) -> PortResult<Option<String>> {
    load_token(store, &user_token_key(user_id)).await
}

pub async fn clear_user_token(store: &dyn KeyValueStore, user_id: Uuid) -> PortResult<()> {
    store.remove(&user_token_key(user_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, String>>);

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> PortResult<Option<String>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: &str) -> PortResult<()> {
            self.0.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }
        async fn remove(&self, key: &str) -> PortResult<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct StubModel {
        response: Result<Vec<LabelScore>, ()>,
        calls: AtomicUsize,
        tokens_seen: Mutex<Vec<String>>,
    }

    impl StubModel {
        fn answering(labels: &[(&str, f64)]) -> Self {
            Self {
                response: Ok(labels
                    .iter()
                    .map(|(l, s)| LabelScore {
                        label: l.to_string(),
                        score: *s,
                    })
                    .collect()),
                calls: AtomicUsize::new(0),
                tokens_seen: Mutex::default(),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(()),
                calls: AtomicUsize::new(0),
                tokens_seen: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl TextClassificationService for StubModel {
        async fn classify_text(&self, _text: &str, token: &str) -> PortResult<Vec<LabelScore>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens_seen.lock().unwrap().push(token.to_string());
            self.response
                .clone()
                .map_err(|_| PortError::Unexpected("status 500".to_string()))
        }
    }

    async fn remote(model: Arc<StubModel>, token: Option<&str>) -> RemoteClassifier {
        let store = Arc::new(MapStore::default());
        if let Some(t) = token {
            set_token(store.as_ref(), t).await.unwrap();
        }
        RemoteClassifier::new(model, store, RuleBasedClassifier::new())
    }

    #[test]
    fn rules_match_case_insensitive_substrings() {
        let rules = RuleBasedClassifier::new();
        assert_eq!(rules.categorize("Whole MILK"), ProductCategory::Dairy);
        assert_eq!(rules.categorize("eggs"), ProductCategory::Dairy);
        assert_eq!(rules.categorize("bananas"), ProductCategory::Produce);
        assert_eq!(rules.categorize("HDMI cable"), ProductCategory::Electronics);
        assert_eq!(rules.categorize("widgets"), ProductCategory::Uncategorized);
    }

    #[test]
    fn earlier_rule_shadows_later_one() {
        // "butter" is dairy before anything else gets a look.
        let rules = RuleBasedClassifier::new();
        assert_eq!(rules.categorize("peanut butter"), ProductCategory::Dairy);

        const SOAP: &[&str] = &["soap"];
        let custom = RuleBasedClassifier::with_rules(vec![
            (ProductCategory::Household, SOAP),
            (ProductCategory::CleaningSupplies, SOAP),
        ]);
        assert_eq!(custom.categorize("dish soap"), ProductCategory::Household);
    }

    #[test]
    fn rule_classification_is_idempotent() {
        let rules = RuleBasedClassifier::new();
        for text in ["milk", "Paper Towels", "  ", "mystery"] {
            assert_eq!(rules.categorize(text), rules.categorize(text));
        }
    }

    #[test]
    fn labels_normalize_by_containment() {
        assert_eq!(normalize_label("Cheese & Deli"), Some(ProductCategory::Dairy));
        assert_eq!(normalize_label(" Personal Care "), Some(ProductCategory::HealthAndBeauty));
        assert_eq!(normalize_label("soft drinks"), Some(ProductCategory::Beverages));
        assert_eq!(normalize_label("automotive"), None);
    }

    #[tokio::test]
    async fn remote_uses_highest_scoring_label() {
        let model = Arc::new(StubModel::answering(&[("fruit", 0.2), ("dairy", 0.7), ("drink", 0.1)]));
        let classifier = remote(model.clone(), Some("hf_token")).await;

        let result = classifier.classify("oat thing").await;
        assert_eq!(result, Classification::clean(ProductCategory::Dairy));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_token_skips_the_network() {
        let model = Arc::new(StubModel::answering(&[("dairy", 0.9)]));
        let classifier = remote(model.clone(), None).await;

        let result = classifier.classify("coffee beans").await;
        assert_eq!(result.category, ProductCategory::Beverages);
        assert!(result.degraded.is_some());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_call_falls_back_to_rules_once() {
        let model = Arc::new(StubModel::failing());
        let classifier = remote(model.clone(), Some("hf_token")).await;

        let result = classifier.classify("widgets").await;
        assert_eq!(result.category, ProductCategory::Uncategorized);
        assert!(result.degraded.is_some());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_or_empty_labels_fall_back() {
        let unknown = remote(Arc::new(StubModel::answering(&[("automotive", 0.9)])), Some("t")).await;
        let result = unknown.classify("milk").await;
        assert_eq!(result.category, ProductCategory::Dairy);
        assert!(result.degraded.is_some());

        let empty = remote(Arc::new(StubModel::answering(&[])), Some("t")).await;
        assert!(empty.classify("milk").await.degraded.is_some());
    }

    #[tokio::test]
    async fn blank_token_clears_the_store() {
        let store = MapStore::default();
        set_token(&store, "  abc  ").await.unwrap();
        assert_eq!(get_token(&store).await.unwrap().as_deref(), Some("abc"));
        set_token(&store, "   ").await.unwrap();
        assert_eq!(get_token(&store).await.unwrap(), None);
        set_token(&store, "abc").await.unwrap();
        clear_token(&store).await.unwrap();
        assert_eq!(get_token(&store).await.unwrap(), None);
    }

    #[tokio::test]
    async fn user_token_takes_precedence_and_stays_private() {
        let model = Arc::new(StubModel::answering(&[("dairy", 0.9)]));
        let store = Arc::new(MapStore::default());
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        set_token(store.as_ref(), "hf_shared").await.unwrap();
        set_user_token(store.as_ref(), alice, " hf_alice ").await.unwrap();
        let classifier = RemoteClassifier::new(model.clone(), store.clone(), RuleBasedClassifier::new());

        classifier.classify_for("milk", Some(alice)).await;
        classifier.classify_for("milk", Some(bob)).await;
        classifier.classify("milk").await;
        assert_eq!(
            *model.tokens_seen.lock().unwrap(),
            vec!["hf_alice", "hf_shared", "hf_shared"]
        );

        clear_user_token(store.as_ref(), alice).await.unwrap();
        assert_eq!(get_user_token(store.as_ref(), alice).await.unwrap(), None);
        assert_eq!(get_token(store.as_ref()).await.unwrap().as_deref(), Some("hf_shared"));
    }

    #[tokio::test]
    async fn user_token_alone_is_not_shared() {
        let model = Arc::new(StubModel::answering(&[("dairy", 0.9)]));
        let store = Arc::new(MapStore::default());
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        set_user_token(store.as_ref(), alice, "hf_alice").await.unwrap();
        let classifier = RemoteClassifier::new(model.clone(), store, RuleBasedClassifier::new());

        assert_eq!(classifier.classify_for("milk", Some(alice)).await.degraded, None);
        let other = classifier.classify_for("coffee", Some(bob)).await;
        assert_eq!(other.degraded.as_deref(), Some("API token not set"));
        assert_eq!(other.category, ProductCategory::Beverages);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
