//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    auth::{LoginRequest, SignupRequest},
    dto::{
        DietaryRestrictionsDto, ItemDto, NotificationLevelDto, PreferencesDto, ProductDto,
        ShoppingListDto, UserDto,
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};
use shopping_list_core::classifier::{clear_user_token, set_user_token};
use shopping_list_core::domain::{AuthUser, ProductCategory, ShoppingList, Store, UserPreferences};
use shopping_list_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        categorize_handler,
        list_products_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        get_preferences_handler,
        put_preferences_handler,
        list_lists_handler,
        list_items_handler,
        delete_list_handler,
        set_token_handler,
        clear_token_handler,
    ),
    components(
        schemas(
            CategorizeRequest, CategorizeResponse, ErrorBody, TokenRequest,
            SignupRequest, LoginRequest, UserDto, ProductDto, ItemDto, ShoppingListDto,
            PreferencesDto, DietaryRestrictionsDto, NotificationLevelDto
        )
    ),
    tags(
        (name = "Shopping List API", description = "Categorizes grocery lists and matches them to store products.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Either field is accepted; `text` wins when both are present.
#[derive(Deserialize, ToSchema)]
pub struct CategorizeRequest {
    pub text: Option<String>,
    pub item: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CategorizeResponse {
    pub category: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// A category label such as "Dairy" or "Cleaning Supplies".
    pub category: Option<String>,
    pub store: Option<String>,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Loads a list and checks that `user` owns it. Someone else's list is
/// reported as missing.
async fn owned_list(
    app_state: &AppState,
    user: &AuthUser,
    list_id: Uuid,
) -> Result<ShoppingList, (StatusCode, String)> {
    match app_state.db.get_shopping_list(list_id).await {
        Ok(list) if list.user_id == user.id => Ok(list),
        Ok(_) | Err(PortError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Shopping list not found".to_string()))
        }
        Err(e) => {
            error!("Failed to load shopping list {}: {:?}", list_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load shopping list".to_string(),
            ))
        }
    }
}

//=========================================================================================
// Public Handlers
//=========================================================================================

/// Categorize a single item of text with the keyword rules.
#[utoipa::path(
    post,
    path = "/categorize",
    request_body = CategorizeRequest,
    responses(
        (status = 200, description = "Category resolved", body = CategorizeResponse),
        (status = 400, description = "No text given", body = ErrorBody)
    )
)]
pub async fn categorize_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, (StatusCode, Json<ErrorBody>)> {
    let text = req
        .text
        .or(req.item)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| error_body(StatusCode::BAD_REQUEST, "Item text is required"))?;

    let category = app_state.rules.categorize(&text);
    Ok(Json(CategorizeResponse {
        category: category.to_string(),
    }))
}

/// List catalog products, optionally narrowed by category and store.
#[utoipa::path(
    get,
    path = "/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Matching products in catalog order", body = [ProductDto]),
        (status = 400, description = "Unknown category or store", body = ErrorBody)
    )
)]
pub async fn list_products_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductDto>>, (StatusCode, Json<ErrorBody>)> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<ProductCategory>)
        .transpose()
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, e.to_string()))?;
    let store = query
        .store
        .as_deref()
        .map(str::parse::<Store>)
        .transpose()
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, e.to_string()))?;

    let products = app_state
        .catalog()
        .all()
        .iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .filter(|p| store.map_or(true, |s| p.store == s))
        .map(ProductDto::from)
        .collect();
    Ok(Json(products))
}

/// Fallback for every unknown path.
pub async fn not_found_handler() -> impl IntoResponse {
    error_body(StatusCode::NOT_FOUND, "not found")
}

//=========================================================================================
// Preferences
//=========================================================================================

/// The current user's preferences, or the defaults if none were saved.
#[utoipa::path(
    get,
    path = "/preferences",
    responses(
        (status = 200, description = "Current preferences", body = PreferencesDto),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_preferences_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PreferencesDto>, (StatusCode, String)> {
    let prefs = app_state
        .db
        .fetch_user_preferences(user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch preferences: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load preferences".to_string(),
            )
        })?
        .unwrap_or_default();
    Ok(Json(PreferencesDto::from(prefs)))
}

#[utoipa::path(
    put,
    path = "/preferences",
    request_body = PreferencesDto,
    responses(
        (status = 200, description = "Preferences saved", body = PreferencesDto),
        (status = 400, description = "Unknown store or price preference"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn put_preferences_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(dto): Json<PreferencesDto>,
) -> Result<Json<PreferencesDto>, (StatusCode, String)> {
    let prefs = UserPreferences::try_from(dto).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    app_state
        .db
        .save_user_preferences(user.id, &prefs)
        .await
        .map_err(|e| {
            error!("Failed to save preferences: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save preferences".to_string(),
            )
        })?;
    info!(user_id = %user.id, store = %prefs.preferred_store.as_str(), "Preferences saved");
    Ok(Json(PreferencesDto::from(prefs)))
}

//=========================================================================================
// Saved Lists
//=========================================================================================

/// The user's saved lists, newest first.
#[utoipa::path(
    get,
    path = "/lists",
    responses(
        (status = 200, description = "Saved lists", body = [ShoppingListDto]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_lists_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ShoppingListDto>>, (StatusCode, String)> {
    let lists = app_state
        .db
        .get_user_shopping_lists(user.id)
        .await
        .map_err(|e| {
            error!("Failed to list shopping lists: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load shopping lists".to_string(),
            )
        })?;
    Ok(Json(lists.into_iter().map(ShoppingListDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/lists/{list_id}/items",
    params(("list_id" = Uuid, Path, description = "The shopping list ID")),
    responses(
        (status = 200, description = "Items of the list in saved order", body = [ItemDto]),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such list for this user")
    )
)]
pub async fn list_items_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(list_id): Path<Uuid>,
) -> Result<Json<Vec<ItemDto>>, (StatusCode, String)> {
    owned_list(&app_state, &user, list_id).await?;
    let items = app_state
        .db
        .fetch_shopping_list_items(list_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch items for list {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load items".to_string(),
            )
        })?;
    Ok(Json(items.iter().map(ItemDto::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/lists/{list_id}",
    params(("list_id" = Uuid, Path, description = "The shopping list ID")),
    responses(
        (status = 204, description = "List deleted"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such list for this user")
    )
)]
pub async fn delete_list_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(list_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    owned_list(&app_state, &user, list_id).await?;
    app_state
        .db
        .delete_shopping_list(list_id)
        .await
        .map_err(|e| {
            error!("Failed to delete list {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete shopping list".to_string(),
            )
        })?;
    info!(list_id = %list_id, "Shopping list deleted");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Classifier Token
//=========================================================================================

/// Store the caller's own token for remote classification. It applies to the
/// caller's sessions only and takes precedence over the deployment-wide token.
#[utoipa::path(
    put,
    path = "/classifier/token",
    request_body = TokenRequest,
    responses(
        (status = 204, description = "Token saved"),
        (status = 400, description = "Blank token"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn set_token_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<TokenRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if req.token.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Token must not be blank".to_string()));
    }
    set_user_token(app_state.token_store.as_ref(), user.id, &req.token)
        .await
        .map_err(|e| {
            error!("Failed to store classifier token: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store token".to_string(),
            )
        })?;
    info!(user_id = %user.id, "Classifier token updated");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/classifier/token",
    responses(
        (status = 204, description = "Token removed"),
        (status = 401, description = "Not logged in")
    )
)]
/// Remove the caller's own token; the deployment-wide one applies again.
pub async fn clear_token_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, (StatusCode, String)> {
    clear_user_token(app_state.token_store.as_ref(), user.id)
        .await
        .map_err(|e| {
            error!("Failed to clear classifier token: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to clear token".to_string(),
            )
        })?;
    Ok(StatusCode::NO_CONTENT)
}
