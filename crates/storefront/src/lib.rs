//! Parfum Storefront commerce core.
//!
//! The stateful logic behind the storefront, as a library:
//!
//! - [`cart`] - Cart aggregator, line items, totals and cart persistence
//! - [`catalog`] - Listing filters, query composition and page accumulation
//! - [`checkout`] - Order drafts, submission and the order store
//! - [`session`] - Signed-in shopper identity
//!
//! Storage, transport and rendering live outside this crate and are reached
//! through the [`cart::CartStore`], [`catalog::Catalog`],
//! [`checkout::OrderStore`] and [`session::Identity`] traits.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;

pub use config::StorefrontConfig;
pub use error::{AppError, Result};
