//! Page cache in front of a catalog backend.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use super::query::QueryDescriptor;
use super::{Catalog, CatalogError, CatalogPage};

/// Caches pages by query for a fixed TTL.
///
/// Search queries always go to the backend. Failures are never cached.
pub struct CachedCatalog<C> {
    inner: Arc<CachedCatalogInner<C>>,
}

struct CachedCatalogInner<C> {
    catalog: C,
    cache: Cache<String, CatalogPage>,
}

impl<C> Clone for CachedCatalog<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> std::fmt::Debug for CachedCatalog<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCatalog")
            .field("cached_pages", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl<C> CachedCatalog<C> {
    /// Wrap `catalog` with a cache of at most `capacity` pages, each kept
    /// for `ttl`.
    #[must_use]
    pub fn new(catalog: C, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CachedCatalogInner { catalog, cache }),
        }
    }

    /// The wrapped backend.
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.inner.catalog
    }

    /// Drop every cached page.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }
}

impl<C: Catalog + Send + Sync + 'static> Catalog for CachedCatalog<C> {
    #[instrument(skip_all, fields(limit = query.limit))]
    async fn fetch_page(&self, query: &QueryDescriptor) -> Result<CatalogPage, CatalogError> {
        let key = query.cache_key();

        if let Some(key) = &key
            && let Some(page) = self.inner.cache.get(key).await
        {
            debug!("Cache hit for catalog page");
            return Ok(page);
        }

        let page = self.inner.catalog.fetch_page(query).await?;

        if let Some(key) = key {
            self.inner.cache.insert(key, page.clone()).await;
        }

        Ok(page)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::{CatalogItem, FilterSortSpec, MemoryCatalog, compose};

    fn cached() -> CachedCatalog<MemoryCatalog> {
        let items = vec![CatalogItem {
            id: "p1".into(),
            name: "Oud Wood".to_string(),
            brand: "Tom Ford".to_string(),
            category: "Unisex".to_string(),
            price: Decimal::new(3_200_000, 0),
            has_full_bottle: true,
            has_decant: true,
            featured: false,
            sold_count: 1,
            rating: Decimal::new(48, 1),
            created_at: Utc::now(),
            search_keywords: vec!["oud".to_string()],
            image: None,
        }];
        CachedCatalog::new(MemoryCatalog::new(items), Duration::from_secs(60), 100)
    }

    #[tokio::test]
    async fn test_repeated_query_hits_cache() {
        let catalog = cached();
        let query = compose(&FilterSortSpec::default(), None, 12);

        let first = catalog.fetch_page(&query).await.unwrap();
        let second = catalog.fetch_page(&query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(catalog.catalog().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_search_is_never_cached() {
        let catalog = cached();
        let query = compose(&FilterSortSpec::default().with_search("oud"), None, 12);

        catalog.fetch_page(&query).await.unwrap();
        catalog.fetch_page(&query).await.unwrap();

        assert_eq!(catalog.catalog().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let catalog = cached();
        let query = compose(&FilterSortSpec::default(), None, 12);

        catalog.catalog().fail_next(1);
        assert!(catalog.fetch_page(&query).await.is_err());
        assert_eq!(catalog.fetch_page(&query).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let catalog = cached();
        let query = compose(&FilterSortSpec::default(), None, 12);

        catalog.fetch_page(&query).await.unwrap();
        catalog.invalidate_all();
        catalog.fetch_page(&query).await.unwrap();

        assert_eq!(catalog.catalog().fetch_count(), 2);
    }
}
