//! Integration tests for the parfum storefront core.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p parfum-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Cart merging, quantity rules and persistence
//! - `catalog_paging` - Page accumulation, staleness and fetch retries
//! - `checkout_flow` - Drafting, submission and order status updates
//!
//! This library holds the fixtures the test files share.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::Notify;

use parfum_storefront::catalog::{
    Catalog, CatalogError, CatalogItem, CatalogPage, MemoryCatalog, QueryDescriptor,
};

/// `n` catalog items in `category`, created one day apart, priced
/// 100,000 upward in steps of 10,000.
#[must_use]
pub fn catalog_items(prefix: &str, category: &str, n: usize) -> Vec<CatalogItem> {
    let base = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();

    (0..n)
        .map(|i| {
            let step = i64::try_from(i).unwrap_or(i64::MAX);
            CatalogItem {
                id: format!("{prefix}-{i:03}").into(),
                name: format!("{category} Scent {i}"),
                brand: if i % 2 == 0 { "Creed" } else { "Dior" }.to_string(),
                category: category.to_string(),
                price: Decimal::from(100_000 + step * 10_000),
                has_full_bottle: true,
                has_decant: i % 3 == 0,
                featured: i % 5 == 0,
                sold_count: u64::try_from(i).unwrap_or_default() * 7 % 11,
                rating: Decimal::new(40 + step % 10, 1),
                created_at: base + Duration::days(step),
                search_keywords: vec![category.to_lowercase(), format!("scent{i}")],
                image: None,
            }
        })
        .collect()
}

/// A catalog that can hold its first fetch until released.
///
/// Lets a test change the listing spec while a fetch is in flight.
#[derive(Debug)]
pub struct GatedCatalog {
    inner: MemoryCatalog,
    hold_next: AtomicBool,
    started: Notify,
    release: Notify,
}

impl GatedCatalog {
    #[must_use]
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            inner: MemoryCatalog::new(items),
            hold_next: AtomicBool::new(false),
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Hold the next fetch until [`GatedCatalog::release`] is called.
    pub fn hold_next(&self) {
        self.hold_next.store(true, Ordering::SeqCst);
    }

    /// Wait until a held fetch has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let the held fetch proceed.
    pub fn release(&self) {
        self.release.notify_one();
    }

    #[must_use]
    pub const fn inner(&self) -> &MemoryCatalog {
        &self.inner
    }
}

impl Catalog for GatedCatalog {
    async fn fetch_page(&self, query: &QueryDescriptor) -> Result<CatalogPage, CatalogError> {
        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.started.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch_page(query).await
    }
}
