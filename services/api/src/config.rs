//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use shopping_list_core::ClassifierMode;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_CLASSIFIER_URL: &str =
    "https://api-inference.huggingface.co/models/masakaeugene/grocery-classifier";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where users, lists and preferences live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres(String),
    /// Selected with `DATABASE_URL=memory`; nothing survives a restart.
    InMemory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database: DatabaseBackend,
    pub log_level: Level,
    pub classifier_mode: ClassifierMode,
    pub classifier_url: String,
    pub classifier_token: Option<String>,
    pub token_store_path: PathBuf,
    pub checkout_delay: Duration,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let database = if database_url.trim().eq_ignore_ascii_case("memory") {
            DatabaseBackend::InMemory
        } else {
            DatabaseBackend::Postgres(database_url)
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Classifier Settings ---
        let classifier_mode = match lookup("CLASSIFIER_MODE")
            .unwrap_or_else(|| "rules".to_string())
            .to_lowercase()
            .as_str()
        {
            "rules" => ClassifierMode::Rules,
            "remote" => ClassifierMode::Remote,
            other => {
                return Err(ConfigError::InvalidValue(
                    "CLASSIFIER_MODE".to_string(),
                    format!("'{}' is not one of 'rules' or 'remote'", other),
                ))
            }
        };
        let classifier_url =
            lookup("CLASSIFIER_URL").unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string());
        let classifier_token = lookup("CLASSIFIER_TOKEN").filter(|t| !t.trim().is_empty());
        let token_store_path = lookup("TOKEN_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.classifier_token.json"));

        // --- Checkout and CORS ---
        let checkout_delay_ms = match lookup("CHECKOUT_DELAY_MS") {
            Some(v) => v.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("CHECKOUT_DELAY_MS".to_string(), e.to_string())
            })?,
            None => 2000,
        };
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database,
            log_level,
            classifier_mode,
            classifier_url,
            classifier_token,
            token_store_path,
            checkout_delay: Duration::from_millis(checkout_delay_ms),
            cors_origin,
        })
    }
}
