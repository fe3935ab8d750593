//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `INVENTORY_API_URL` - Base URL of the catalog API (serves `products/{id}` and `stock/{id}`)
//!
//! ## Optional
//! - `INVENTORY_API_TOKEN` - Bearer token sent to the catalog API
//! - `INVENTORY_TIMEOUT_SECS` - Per-request timeout (default: none, requests wait indefinitely)
//! - `PRODUCT_CACHE_TTL_SECS` - Product details cache lifetime (default: 300)
//! - `PRODUCT_CACHE_CAPACITY` - Maximum cached products (default: 1000)
//! - `CART_STORAGE_PATH` - Local storage file (default: .rocketshoes/storage.json)
//! - `CART_STORAGE_KEY` - Key the cart snapshot is stored under (default: @RocketShoes:cart)
//! - `CART_CURRENCY` - ISO 4217 code used to display prices (default: BRL)

use std::path::PathBuf;
use std::time::Duration;

use rocketshoes_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::storage::DEFAULT_CART_KEY;

const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog API configuration
    pub inventory: InventoryConfig,
    /// Local storage file holding the cart snapshot
    pub storage_path: PathBuf,
    /// Key the cart snapshot is stored under
    pub storage_key: String,
    /// Currency used to display prices
    pub currency: CurrencyCode,
}

/// Catalog API configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct InventoryConfig {
    /// Base URL; always ends with `/` so relative joins stay under it
    pub base_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// Per-request timeout, `None` to wait indefinitely
    pub timeout: Option<Duration>,
    /// Product details cache lifetime
    pub cache_ttl: Duration,
    /// Maximum number of cached products
    pub cache_capacity: u64,
}

impl std::fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let inventory = InventoryConfig::from_env(&env)?;
        let storage_path = PathBuf::from(env.or_default("CART_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let storage_key = env.or_default("CART_STORAGE_KEY", DEFAULT_CART_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let currency = env
            .or_default("CART_CURRENCY", CurrencyCode::default().code())
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_CURRENCY".to_string(), e.to_string()))?;

        Ok(Self {
            inventory,
            storage_path,
            storage_key,
            currency,
        })
    }
}

impl InventoryConfig {
    fn from_env<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url("INVENTORY_API_URL", &env.required("INVENTORY_API_URL")?)?;
        let api_token = env
            .optional("INVENTORY_API_TOKEN")
            .filter(|token| !token.is_empty())
            .map(SecretString::from);
        let timeout = env
            .optional("INVENTORY_TIMEOUT_SECS")
            .map(|raw| parse_secs("INVENTORY_TIMEOUT_SECS", &raw))
            .transpose()?;
        let cache_ttl = parse_secs(
            "PRODUCT_CACHE_TTL_SECS",
            &env.or_default("PRODUCT_CACHE_TTL_SECS", &DEFAULT_CACHE_TTL_SECS.to_string()),
        )?;
        let cache_capacity = env
            .or_default("PRODUCT_CACHE_CAPACITY", &DEFAULT_CACHE_CAPACITY.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PRODUCT_CACHE_CAPACITY".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            api_token,
            timeout,
            cache_ttl,
            cache_capacity,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the usual required/optional/default accessors.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse an HTTP(S) base URL and make sure its path ends with `/`.
pub(crate) fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse a whole number of seconds.
fn parse_secs(var_name: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}
