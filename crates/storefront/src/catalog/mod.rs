//! Catalog listing: filter/sort selections, query composition and paging.
//!
//! # Architecture
//!
//! - [`FilterSortSpec`] describes what the shopper asked for
//! - [`compose`] turns a spec plus a cursor into a [`QueryDescriptor`]
//! - a [`Catalog`] answers one descriptor with one [`CatalogPage`]
//! - [`CatalogFeed`] drives a [`PageAccumulator`] over a catalog, appending
//!   pages and discarding the ones that arrive after the spec changed
//!
//! # Example
//!
//! ```rust,ignore
//! use parfum_storefront::catalog::{CatalogFeed, FilterSortSpec, MemoryCatalog, SortKey};
//!
//! let catalog = MemoryCatalog::from_path("catalog.json")?;
//! let feed = CatalogFeed::new(catalog, 12);
//!
//! feed.apply_spec(FilterSortSpec::default().with_sort(SortKey::PriceAsc)).await?;
//! while feed.has_more()? {
//!     feed.fetch_next().await?;
//! }
//! ```

mod cache;
mod cursor;
mod feed;
mod memory;
mod query;
mod spec;

pub use cache::CachedCatalog;
pub use cursor::{CursorKey, PageCursor, SortValue};
pub use feed::{CatalogFeed, FeedState, FetchOutcome, FetchTicket, PageAccumulator};
pub use memory::MemoryCatalog;
pub use query::{Direction, Field, FieldValue, OrderBy, Predicate, QueryDescriptor, compose};
pub use spec::{FilterSortSpec, ListingParams, Shelf, SortKey, TypeFilter};

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use parfum_core::ProductId;

/// Errors from a catalog backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backend could not be reached or refused the query.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// The continuation cursor could not be decoded.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Catalog data could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A product document as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    /// Full-bottle price in the store currency.
    pub price: Decimal,
    #[serde(default)]
    pub has_full_bottle: bool,
    #[serde(default)]
    pub has_decant: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sold_count: u64,
    #[serde(default)]
    pub rating: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub search_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    /// Cursor of the last item, `None` for an empty page.
    pub end_cursor: Option<PageCursor>,
}

/// A catalog backend.
pub trait Catalog {
    /// Fetch the page described by `query`.
    ///
    /// Items come back in `query.order_by` order (ties broken by id),
    /// starting strictly after `query.start_after`, at most `query.limit`
    /// of them.
    fn fetch_page(
        &self,
        query: &QueryDescriptor,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;
}

impl<C: Catalog + Send + Sync> Catalog for Arc<C> {
    fn fetch_page(
        &self,
        query: &QueryDescriptor,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send {
        (**self).fetch_page(query)
    }
}
