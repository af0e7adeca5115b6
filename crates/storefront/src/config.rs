//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `PARFUM_CART_PATH` - File backing the persisted cart (default: .parfum/cart.json)
//! - `PARFUM_CART_KEY` - Key the cart is stored under (default: parfumCart)
//! - `PARFUM_PAGE_SIZE` - Catalog page size, 1 to 100 (default: 12)
//! - `PARFUM_CURRENCY` - Store currency code (default: IDR)
//! - `PARFUM_CATALOG_CACHE_TTL_SECS` - Catalog page cache TTL (default: 300)
//! - `PARFUM_CATALOG_CACHE_CAPACITY` - Max cached catalog pages (default: 1000)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use parfum_core::CurrencyCode;

use crate::cart::FileCartStore;
use crate::catalog::CachedCatalog;

const DEFAULT_CART_PATH: &str = ".parfum/cart.json";
const DEFAULT_CART_KEY: &str = "parfumCart";
const DEFAULT_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Persisted cart location
    pub cart: CartConfig,
    /// Catalog paging and caching
    pub catalog: CatalogConfig,
    /// Currency all prices are expressed in
    pub currency: CurrencyCode,
}

/// Persisted cart location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    pub path: PathBuf,
    pub key: String,
}

/// Catalog paging and caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    pub page_size: u32,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            cart: CartConfig::default(),
            catalog: CatalogConfig::default(),
            currency: CurrencyCode::default(),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CART_PATH),
            key: DEFAULT_CART_KEY.to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let page_size: u32 = env.parse_or("PARFUM_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::InvalidEnvVar(
                "PARFUM_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE} (got {page_size})"),
            ));
        }

        Ok(Self {
            cart: CartConfig {
                path: PathBuf::from(env.get_or_default("PARFUM_CART_PATH", DEFAULT_CART_PATH)),
                key: env.get_or_default("PARFUM_CART_KEY", DEFAULT_CART_KEY),
            },
            catalog: CatalogConfig {
                page_size,
                cache_ttl: Duration::from_secs(
                    env.parse_or("PARFUM_CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
                ),
                cache_capacity: env
                    .parse_or("PARFUM_CATALOG_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
            },
            currency: env.parse_or("PARFUM_CURRENCY", CurrencyCode::default())?,
        })
    }
}

impl CartConfig {
    /// File-backed cart store at the configured location.
    #[must_use]
    pub fn store(&self) -> FileCartStore {
        FileCartStore::new(&self.path, &self.key)
    }
}

impl CatalogConfig {
    /// Wrap `catalog` in a page cache sized by this configuration.
    #[must_use]
    pub fn cached<C>(&self, catalog: C) -> CachedCatalog<C> {
        CachedCatalog::new(catalog, self.cache_ttl, self.cache_capacity)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable; empty values count as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}
