//! Unified error handling.
//!
//! Each concern has its own error enum next to the code that raises it.
//! `AppError` unifies them for callers that drive several concerns at once
//! (the CLI, embedding applications).

use thiserror::Error;

use crate::cart::{CartError, CartStoreError};
use crate::catalog::CatalogError;
use crate::checkout::{OrderStoreError, SubmitError, ValidationError};
use crate::config::ConfigError;

/// Application-level error type for the storefront core.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Persisted cart could not be read or written.
    #[error("Cart store error: {0}")]
    CartStore(#[from] CartStoreError),

    /// A cart mutation was refused.
    #[error("Cart error: {0}")]
    Cart(CartError),

    /// Catalog backend failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Checkout input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Order store failed.
    #[error("Order store error: {0}")]
    OrderStore(#[from] OrderStoreError),
}

impl AppError {
    /// Whether re-invoking the failed operation may succeed.
    ///
    /// Rejected input and broken configuration fail the same way again;
    /// everything else is a collaborator failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Validation(_) | Self::Config(_) | Self::Cart(CartError::AmountOverflow)
        )
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Store(e) => Self::CartStore(e),
            other @ CartError::AmountOverflow => Self::Cart(other),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        Self::OrderStore(err.source)
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
