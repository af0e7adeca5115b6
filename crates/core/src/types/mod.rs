//! Core types for the parfum storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;
pub mod text;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
pub use text::{NonBlank, TextError};
