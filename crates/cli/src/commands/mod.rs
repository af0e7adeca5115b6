//! CLI subcommands.

pub mod cart;
pub mod catalog;
pub mod checkout;

use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

use parfum_storefront::AppError;
use parfum_storefront::cart::{CartError, CartStoreError};
use parfum_storefront::catalog::CatalogError;
use parfum_storefront::checkout::ValidationError;
use parfum_storefront::config::ConfigError;

pub use cart::CartAction;
pub use catalog::CatalogAction;
pub use checkout::CheckoutAction;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The storefront core rejected the operation.
    #[error(transparent)]
    App(#[from] AppError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

macro_rules! from_core_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CommandError {
                fn from(err: $ty) -> Self {
                    Self::App(err.into())
                }
            }
        )*
    };
}

from_core_error!(
    ConfigError,
    CartError,
    CartStoreError,
    CatalogError,
    ValidationError,
);

/// Write one line to stdout.
pub fn out(line: impl std::fmt::Display) -> Result<(), CommandError> {
    writeln!(io::stdout().lock(), "{line}")?;
    Ok(())
}

/// Write `value` to stdout as pretty JSON.
pub fn out_json(value: &impl Serialize) -> Result<(), CommandError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
