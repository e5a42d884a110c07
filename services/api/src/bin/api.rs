//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FileTokenStore, HttpClassifierAdapter, InMemoryDb, SimulatedCheckout},
    config::{Config, DatabaseBackend},
    error::ApiError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use shopping_list_core::classifier::set_token;
use shopping_list_core::ports::{DatabaseService, KeyValueStore};
use shopping_list_core::{
    CategoryClassifier, ClassifierMode, ListProcessor, ProductCatalog, ProductMatcher,
    RemoteClassifier, RuleBasedClassifier,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.database {
        DatabaseBackend::Postgres(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        DatabaseBackend::InMemory => {
            warn!("Using the in-memory database; data is lost on restart.");
            Arc::new(InMemoryDb::new())
        }
    };

    // --- 3. Classifier Token Store ---
    let token_store: Arc<dyn KeyValueStore> =
        Arc::new(FileTokenStore::new(config.token_store_path.clone()));
    if let Some(token) = &config.classifier_token {
        set_token(token_store.as_ref(), token).await?;
        info!("Classifier token seeded from the environment.");
    }

    // --- 4. Classification Strategy & List Processor ---
    let rules = RuleBasedClassifier::new();
    let classifier: Arc<dyn CategoryClassifier> = match config.classifier_mode {
        ClassifierMode::Rules => Arc::new(rules.clone()),
        ClassifierMode::Remote => {
            let service = Arc::new(HttpClassifierAdapter::new(
                reqwest::Client::new(),
                config.classifier_url.clone(),
            ));
            Arc::new(RemoteClassifier::new(service, token_store.clone(), rules.clone()))
        }
    };
    info!(mode = ?config.classifier_mode, "Classifier ready.");

    let catalog = Arc::new(ProductCatalog::seeded());
    let processor = Arc::new(ListProcessor::new(classifier, ProductMatcher::new(catalog)));

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        processor,
        rules,
        token_store,
        checkout: Arc::new(SimulatedCheckout::new(config.checkout_delay)),
    });

    // --- 6. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(build_router(app_state))
        .layer(cors);

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
