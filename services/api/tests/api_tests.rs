//! Integration tests for the REST surface.
//!
//! The router is driven in-process with `oneshot`, backed by the in-memory
//! database and token store.

use api_lib::adapters::{InMemoryDb, MemoryTokenStore, SimulatedCheckout};
use api_lib::web::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shopping_list_core::classifier::{get_token, get_user_token, set_token};
use shopping_list_core::domain::{ProductCategory, ShoppingListItem, DEFAULT_LIST_NAME};
use shopping_list_core::ports::DatabaseService;
use shopping_list_core::{ListProcessor, ProductCatalog, ProductMatcher, RuleBasedClassifier};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

struct TestApp {
    router: Router,
    db: Arc<InMemoryDb>,
    tokens: Arc<MemoryTokenStore>,
}

/// Test helper: Create the app over fresh in-memory adapters
fn setup_app() -> TestApp {
    let db = Arc::new(InMemoryDb::new());
    let tokens = Arc::new(MemoryTokenStore::new());
    let matcher = ProductMatcher::new(Arc::new(ProductCatalog::seeded()));
    let state = Arc::new(AppState {
        db: db.clone(),
        processor: Arc::new(ListProcessor::new(
            Arc::new(RuleBasedClassifier::new()),
            matcher,
        )),
        rules: RuleBasedClassifier::new(),
        token_store: tokens.clone(),
        checkout: Arc::new(SimulatedCheckout::new(Duration::ZERO)),
    });
    TestApp {
        router: build_router(state),
        db,
        tokens,
    }
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> Response {
    app.router.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Signs up a fresh user and returns the `session=...` cookie pair and the user id.
async fn sign_up(app: &TestApp, email: &str) -> (String, String) {
    let response = send(
        app,
        request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": email, "password": "hunter22" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("signup sets a session cookie")
        .to_string();
    let body = json_body(response).await;
    (cookie, body["id"].as_str().unwrap().to_string())
}

// =============================================================================
// Public Endpoints
// =============================================================================

#[tokio::test]
async fn categorize_uses_keyword_rules() {
    let app = setup_app();

    let response = send(&app, request("POST", "/categorize", None, Some(json!({ "text": "Greek Yogurt" })))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["category"], "Dairy");

    let response = send(&app, request("POST", "/categorize", None, Some(json!({ "item": "dish soap" })))).await;
    assert_eq!(json_body(response).await["category"], "Cleaning Supplies");

    let response = send(&app, request("POST", "/categorize", None, Some(json!({ "text": "widgets" })))).await;
    assert_eq!(json_body(response).await["category"], "Uncategorized");
}

#[tokio::test]
async fn categorize_requires_text() {
    let app = setup_app();
    for body in [json!({}), json!({ "text": "   " })] {
        let response = send(&app, request("POST", "/categorize", None, Some(body))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn products_filter_by_category_and_store() {
    let app = setup_app();

    let response = send(&app, request("GET", "/products", None, None)).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 15);

    let response = send(&app, request("GET", "/products?category=Dairy&store=Walmart", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let products = json_body(response).await;
    let products = products.as_array().unwrap();
    assert!(!products.is_empty());
    assert!(products
        .iter()
        .all(|p| p["category"] == "Dairy" && p["store"] == "Walmart"));

    let response = send(&app, request("GET", "/products?category=Toys", None, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_paths_answer_not_found() {
    let app = setup_app();
    let response = send(&app, request("GET", "/no/such/page", None, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({ "error": "not found" }));
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = setup_app();
    for uri in ["/auth/me", "/preferences", "/lists"] {
        let response = send(&app, request("GET", uri, None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    let response = send(&app, request("GET", "/lists", Some("session=bogus"), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_logout() {
    let app = setup_app();
    let (cookie, _) = sign_up(&app, "Sam@Example.com").await;

    let response = send(&app, request("GET", "/auth/me", Some(cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = json_body(response).await;
    assert_eq!(me["email"], "sam@example.com");
    assert_eq!(me["name"], "sam");

    // Same email again
    let response = send(
        &app,
        request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": "sam@example.com", "password": "another1" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let wrong = json!({ "email": "sam@example.com", "password": "nope-nope" });
    let response = send(&app, request("POST", "/auth/login", None, Some(wrong))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let right = json!({ "email": "sam@example.com", "password": "hunter22" });
    let response = send(&app, request("POST", "/auth/login", None, Some(right))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let response = send(&app, request("POST", "/auth/logout", Some(cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, request("GET", "/auth/me", Some(cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_malformed_email() {
    let app = setup_app();
    let body = json!({ "email": "not-an-email", "password": "hunter22" });
    let response = send(&app, request("POST", "/auth/signup", None, Some(body))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Preferences
// =============================================================================

#[tokio::test]
async fn preferences_default_then_round_trip() {
    let app = setup_app();
    let (cookie, _) = sign_up(&app, "pat@example.com").await;

    let response = send(&app, request("GET", "/preferences", Some(cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let prefs = json_body(response).await;
    assert_eq!(prefs["preferred_store"], "No Preference");
    assert_eq!(prefs["price_preference"], "lowest");
    assert_eq!(prefs["dietary_restrictions"]["vegan"], false);

    let update = json!({
        "preferred_store": "Instacart",
        "dietary_restrictions": { "vegan": true },
        "price_preference": "premium"
    });
    let response = send(&app, request("PUT", "/preferences", Some(cookie.as_str()), Some(update))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, request("GET", "/preferences", Some(cookie.as_str()), None)).await;
    let prefs = json_body(response).await;
    assert_eq!(prefs["preferred_store"], "Instacart");
    assert_eq!(prefs["dietary_restrictions"]["vegan"], true);
    assert_eq!(prefs["price_preference"], "premium");

    let bad = json!({ "preferred_store": "Costco", "price_preference": "lowest" });
    let response = send(&app, request("PUT", "/preferences", Some(cookie.as_str()), Some(bad))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Saved Lists
// =============================================================================

#[tokio::test]
async fn lists_are_visible_only_to_their_owner() {
    let app = setup_app();
    let (cookie, user_id) = sign_up(&app, "lee@example.com").await;
    let (other_cookie, _) = sign_up(&app, "kim@example.com").await;

    let list = app
        .db
        .create_shopping_list(user_id.parse().unwrap(), DEFAULT_LIST_NAME)
        .await
        .unwrap();
    let catalog = ProductCatalog::seeded();
    let items = vec![
        ShoppingListItem::pending("milk").settle(ProductCategory::Dairy, catalog.get("p1").cloned()),
        ShoppingListItem::pending("widgets").settle(ProductCategory::Uncategorized, None),
    ];
    app.db.save_shopping_list_items(list.id, &items).await.unwrap();

    let response = send(&app, request("GET", "/lists", Some(cookie.as_str()), None)).await;
    let lists = json_body(response).await;
    assert_eq!(lists.as_array().unwrap().len(), 1);
    assert_eq!(lists[0]["name"], DEFAULT_LIST_NAME);

    let items_uri = format!("/lists/{}/items", list.id);
    let response = send(&app, request("GET", &items_uri, Some(cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = json_body(response).await;
    assert_eq!(stored[0]["text"], "milk");
    assert_eq!(stored[0]["product"]["id"], "p1");
    assert_eq!(stored[1]["product"], Value::Null);

    let response = send(&app, request("GET", &items_uri, Some(other_cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let list_uri = format!("/lists/{}", list.id);
    let response = send(&app, request("DELETE", &list_uri, Some(other_cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, request("DELETE", &list_uri, Some(cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request("GET", "/lists", Some(cookie.as_str()), None)).await;
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

// =============================================================================
// Classifier Token
// =============================================================================

#[tokio::test]
async fn classifier_token_is_scoped_to_the_caller() {
    let app = setup_app();
    set_token(app.tokens.as_ref(), "hf_shared").await.unwrap();
    let (ray_cookie, ray_id) = sign_up(&app, "ray@example.com").await;
    let (_, kim_id) = sign_up(&app, "kim@example.com").await;
    let ray = uuid::Uuid::parse_str(&ray_id).unwrap();
    let kim = uuid::Uuid::parse_str(&kim_id).unwrap();

    let response = send(&app, request("PUT", "/classifier/token", Some(ray_cookie.as_str()), Some(json!({ "token": "  " })))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, request("PUT", "/classifier/token", Some(ray_cookie.as_str()), Some(json!({ "token": " hf_abc " })))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        get_user_token(app.tokens.as_ref(), ray).await.unwrap().as_deref(),
        Some("hf_abc")
    );
    assert_eq!(get_user_token(app.tokens.as_ref(), kim).await.unwrap(), None);
    assert_eq!(
        get_token(app.tokens.as_ref()).await.unwrap().as_deref(),
        Some("hf_shared")
    );

    let response = send(&app, request("DELETE", "/classifier/token", Some(ray_cookie.as_str()), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(get_user_token(app.tokens.as_ref(), ray).await.unwrap(), None);
    assert_eq!(
        get_token(app.tokens.as_ref()).await.unwrap().as_deref(),
        Some("hf_shared")
    );
}
