//! Parfum Core - Shared types library.
//!
//! This crate provides common types used across all parfum components:
//! - `storefront` - Commerce state core (cart, catalog listing, checkout)
//! - `cli` - Command-line driver for the storefront core
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, statuses and
//!   required text

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
