use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_BUY_NOW_TTL_SECS: i64 = 1800;

/// Policy applied when a product referenced by a cart or buy-now line no
/// longer exists at checkout time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingProductPolicy {
    /// Reject the whole checkout
    Fail,
    /// Drop the line and continue with the rest
    Skip,
}

/// Application configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key used to sign customer and admin tokens
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Payment gateway API key id (sent to clients to open the payment widget)
    pub payment_key_id: String,

    /// Payment gateway API key secret; also the HMAC secret for callback
    /// signature verification
    #[validate(length(min = 1))]
    pub payment_key_secret: String,

    /// Payment gateway base URL
    #[serde(default = "default_payment_api_base")]
    pub payment_api_base: String,

    /// Currency code used for all gateway orders
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Back-office bootstrap credentials
    pub admin_email: String,
    pub admin_password: String,

    /// Directory where uploaded customization/review/product images are stored
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Upload size limit in bytes
    #[serde(default = "default_upload_max_bytes")]
    pub upload_max_bytes: usize,

    /// Lifetime of a stashed buy-now selection (seconds)
    #[serde(default = "default_buy_now_ttl_secs")]
    pub buy_now_ttl_secs: i64,

    /// What to do when a quoted product has vanished: "fail" or "skip"
    #[serde(default = "default_missing_product_policy")]
    #[validate(custom = "validate_missing_product_policy")]
    pub checkout_missing_product_policy: String,
}

fn default_jwt_expiration() -> usize {
    86_400
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_payment_api_base() -> String {
    "https://api.payments.example.com".to_string()
}
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
fn default_upload_dir() -> String {
    DEFAULT_UPLOAD_DIR.to_string()
}
fn default_upload_max_bytes() -> usize {
    DEFAULT_UPLOAD_MAX_BYTES
}
fn default_buy_now_ttl_secs() -> i64 {
    DEFAULT_BUY_NOW_TTL_SECS
}
fn default_missing_product_policy() -> String {
    "fail".to_string()
}

fn validate_missing_product_policy(value: &str) -> Result<(), ValidationError> {
    match value {
        "fail" | "skip" => Ok(()),
        _ => Err(ValidationError::new("checkout_missing_product_policy")),
    }
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn missing_product_policy(&self) -> MissingProductPolicy {
        match self.checkout_missing_product_policy.as_str() {
            "skip" => MissingProductPolicy::Skip,
            _ => MissingProductPolicy::Fail,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: jwt_secret and the payment gateway keys have no defaults - they
    // MUST be provided via environment variable or config file.
    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET with a secure random string (minimum 32 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    if config.get_string("payment_key_secret").is_err() {
        error!("Payment gateway secret is not configured. Set APP__PAYMENT_KEY_SECRET.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "payment_key_secret is required but not configured.".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

/// Fixed configuration for unit and integration tests
#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt_secret: "test_secret_that_is_long_enough_for_validation".into(),
        jwt_expiration: default_jwt_expiration(),
        host: default_host(),
        port: default_port(),
        environment: "development".into(),
        log_level: default_log_level(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        db_max_connections: default_db_max_connections(),
        db_min_connections: default_db_min_connections(),
        db_connect_timeout_secs: default_db_connect_timeout_secs(),
        db_idle_timeout_secs: default_db_idle_timeout_secs(),
        db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        payment_key_id: "key_test".into(),
        payment_key_secret: "gateway_secret".into(),
        payment_api_base: default_payment_api_base(),
        currency: default_currency(),
        admin_email: "admin@example.com".into(),
        admin_password: "admin_password".into(),
        upload_dir: default_upload_dir(),
        upload_max_bytes: default_upload_max_bytes(),
        buy_now_ttl_secs: default_buy_now_ttl_secs(),
        checkout_missing_product_policy: default_missing_product_policy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_product_policy_parses() {
        let mut cfg = test_config();
        assert_eq!(cfg.missing_product_policy(), MissingProductPolicy::Fail);

        cfg.checkout_missing_product_policy = "skip".into();
        assert_eq!(cfg.missing_product_policy(), MissingProductPolicy::Skip);
    }

    #[test]
    fn missing_product_policy_rejects_unknown_value() {
        let mut cfg = test_config();
        cfg.checkout_missing_product_policy = "ignore".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn short_jwt_secret_fails_validation() {
        let mut cfg = test_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }
}
