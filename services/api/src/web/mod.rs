pub mod auth;
pub mod dto;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Builds every API route on top of `app_state`. CORS and the Swagger UI are
/// layered on by the binary.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/categorize", post(rest::categorize_handler))
        .route("/products", get(rest::list_products_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/preferences",
            get(rest::get_preferences_handler).put(rest::put_preferences_handler),
        )
        .route("/lists", get(rest::list_lists_handler))
        .route("/lists/{list_id}", axum::routing::delete(rest::delete_list_handler))
        .route("/lists/{list_id}/items", get(rest::list_items_handler))
        .route(
            "/classifier/token",
            put(rest::set_token_handler).delete(rest::clear_token_handler),
        )
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(rest::not_found_handler)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(app_state)
}
