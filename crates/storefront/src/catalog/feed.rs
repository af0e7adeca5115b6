//! Page accumulation.
//!
//! [`PageAccumulator`] is the synchronous state machine: it decides when a
//! fetch may start, what to ask for, and whether an arriving page still
//! belongs to the current spec. [`CatalogFeed`] drives it against a
//! [`Catalog`], releasing the lock while a fetch is in flight so the spec
//! can change underneath it.
//!
//! ```text
//! Empty ──reset──▶ Loading ──page──▶ Ready ──begin_fetch──▶ LoadingMore
//!                     │                ▲  ◀──page (full)────────┘ │
//!                     └──fail──────────┘  ◀──fail─────────────────┘
//!                                      page (short) ──▶ Exhausted
//! ```

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, instrument, warn};

use super::cursor::PageCursor;
use super::query::{QueryDescriptor, compose};
use super::spec::FilterSortSpec;
use super::{Catalog, CatalogError, CatalogItem, CatalogPage};

/// Where the accumulator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No spec applied yet.
    Empty,
    /// First page of the current spec in flight.
    Loading,
    /// Idle, more pages may exist.
    Ready,
    /// A follow-up page is in flight.
    LoadingMore,
    /// The last page was short; nothing more to fetch.
    Exhausted,
}

/// A fetch the accumulator has agreed to, tagged with the spec generation
/// it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: QueryDescriptor,
}

/// What happened to a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was appended.
    Appended { added: usize, has_more: bool },
    /// The fetch failed; the accumulator is `Ready` for a retry.
    Failed,
    /// The spec changed while the fetch was in flight; the result was
    /// discarded.
    Stale,
    /// No fetch was started (one is already in flight, or nothing is left).
    Skipped,
}

/// Accumulates pages of one spec into a single result list.
#[derive(Debug, Clone)]
pub struct PageAccumulator {
    spec: FilterSortSpec,
    page_size: u32,
    items: Vec<CatalogItem>,
    cursor: Option<PageCursor>,
    state: FeedState,
    generation: u64,
}

impl PageAccumulator {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            spec: FilterSortSpec::default(),
            page_size,
            items: Vec::new(),
            cursor: None,
            state: FeedState::Empty,
            generation: 0,
        }
    }

    /// Switch to `spec`: drop everything accumulated, start a new
    /// generation and issue its first fetch.
    ///
    /// Any fetch still in flight for the previous generation becomes stale.
    pub fn reset(&mut self, spec: FilterSortSpec) -> FetchTicket {
        self.spec = spec;
        self.items.clear();
        self.cursor = None;
        self.generation = self.generation.wrapping_add(1);
        self.state = FeedState::Loading;

        debug!(generation = self.generation, "Listing spec changed");
        self.ticket()
    }

    /// Start the next page fetch.
    ///
    /// Returns `None` unless the accumulator is `Ready`, so a second call
    /// while a fetch is in flight does nothing.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.state != FeedState::Ready {
            debug!(state = ?self.state, "Ignoring fetch request");
            return None;
        }
        self.state = FeedState::LoadingMore;
        Some(self.ticket())
    }

    /// Apply a page fetched for `ticket`.
    pub fn complete(&mut self, ticket: &FetchTicket, page: CatalogPage) -> FetchOutcome {
        if !self.is_current(ticket) {
            return FetchOutcome::Stale;
        }

        let added = page.items.len();
        let has_more = u32::try_from(added).is_ok_and(|n| n == self.page_size);

        self.items.extend(page.items);
        if let Some(cursor) = page.end_cursor {
            self.cursor = Some(cursor);
        }
        self.state = if has_more {
            FeedState::Ready
        } else {
            FeedState::Exhausted
        };

        debug!(
            generation = self.generation,
            added,
            items = self.items.len(),
            has_more,
            "Page appended"
        );
        FetchOutcome::Appended { added, has_more }
    }

    /// Record that the fetch for `ticket` failed.
    ///
    /// The accumulator goes back to `Ready` with its cursor unchanged, so
    /// [`PageAccumulator::begin_fetch`] retries the same page (the first
    /// page, after a failed initial load).
    pub fn fail(&mut self, ticket: &FetchTicket) -> FetchOutcome {
        if !self.is_current(ticket) {
            return FetchOutcome::Stale;
        }
        self.state = FeedState::Ready;
        FetchOutcome::Failed
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        let in_flight = matches!(self.state, FeedState::Loading | FeedState::LoadingMore);
        if ticket.generation != self.generation || !in_flight {
            debug!(
                ticket_generation = ticket.generation,
                generation = self.generation,
                "Discarding stale page"
            );
            return false;
        }
        true
    }

    fn ticket(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            query: compose(&self.spec, self.cursor.as_ref(), self.page_size),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    #[must_use]
    pub const fn state(&self) -> FeedState {
        self.state
    }

    /// Whether another page may exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state != FeedState::Exhausted
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    #[must_use]
    pub const fn spec(&self) -> &FilterSortSpec {
        &self.spec
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }
}

// =============================================================================
// CatalogFeed
// =============================================================================

/// Async driver for a [`PageAccumulator`].
///
/// The accumulator lock is only held between awaits, never across one.
#[derive(Debug)]
pub struct CatalogFeed<C> {
    catalog: C,
    state: Mutex<PageAccumulator>,
}

impl<C: Catalog> CatalogFeed<C> {
    #[must_use]
    pub fn new(catalog: C, page_size: u32) -> Self {
        Self {
            catalog,
            state: Mutex::new(PageAccumulator::new(page_size)),
        }
    }

    /// The catalog backend.
    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Replace the spec and fetch its first page.
    ///
    /// # Errors
    ///
    /// Returns the catalog error if the first page could not be fetched.
    /// The feed is then `Ready` with no items, so
    /// [`CatalogFeed::fetch_next`] retries the first page.
    #[instrument(skip_all)]
    pub async fn apply_spec(&self, spec: FilterSortSpec) -> Result<FetchOutcome, CatalogError> {
        let ticket = self.lock()?.reset(spec);
        self.run(ticket).await
    }

    /// Fetch and append the next page, if the feed is `Ready`.
    ///
    /// Returns [`FetchOutcome::Skipped`] while another fetch is in flight
    /// or once the feed is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the catalog error if the page could not be fetched. The
    /// feed is back in `Ready` with the same cursor.
    #[instrument(skip_all)]
    pub async fn fetch_next(&self) -> Result<FetchOutcome, CatalogError> {
        let Some(ticket) = self.lock()?.begin_fetch() else {
            return Ok(FetchOutcome::Skipped);
        };
        self.run(ticket).await
    }

    async fn run(&self, ticket: FetchTicket) -> Result<FetchOutcome, CatalogError> {
        let result = self.catalog.fetch_page(&ticket.query).await;

        let mut state = self.lock()?;
        match result {
            Ok(page) => Ok(state.complete(&ticket, page)),
            Err(e) => match state.fail(&ticket) {
                FetchOutcome::Stale => Ok(FetchOutcome::Stale),
                _ => {
                    warn!(
                        error = %e,
                        generation = ticket.generation,
                        "Catalog fetch failed"
                    );
                    Err(e)
                }
            },
        }
    }

    /// Copy of the accumulated items.
    ///
    /// # Errors
    ///
    /// Returns an error if the accumulator lock is poisoned.
    pub fn items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.lock()?.items().to_vec())
    }

    /// Current lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the accumulator lock is poisoned.
    pub fn state(&self) -> Result<FeedState, CatalogError> {
        Ok(self.lock()?.state())
    }

    /// Whether another page may exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the accumulator lock is poisoned.
    pub fn has_more(&self) -> Result<bool, CatalogError> {
        Ok(self.lock()?.has_more())
    }

    /// Run `f` against a consistent view of the accumulator.
    ///
    /// # Errors
    ///
    /// Returns an error if the accumulator lock is poisoned.
    pub fn with_accumulator<R>(
        &self,
        f: impl FnOnce(&PageAccumulator) -> R,
    ) -> Result<R, CatalogError> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, PageAccumulator>, CatalogError> {
        self.state
            .lock()
            .map_err(|_| CatalogError::Unavailable("Lock poisoned".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::{MemoryCatalog, SortKey};

    fn items(n: usize) -> Vec<CatalogItem> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| CatalogItem {
                id: format!("p{i:03}").into(),
                name: format!("Scent {i}"),
                brand: "Creed".to_string(),
                category: "Fresh".to_string(),
                price: Decimal::from(100_000 + i * 1_000),
                has_full_bottle: true,
                has_decant: false,
                featured: false,
                sold_count: 0,
                rating: Decimal::ZERO,
                created_at: base + Duration::days(i64::try_from(i).unwrap()),
                search_keywords: Vec::new(),
                image: None,
            })
            .collect()
    }

    fn page(n: usize) -> CatalogPage {
        let items = items(n);
        let end_cursor = items
            .last()
            .map(|i| PageCursor::from_token(i.id.as_str()));
        CatalogPage { items, end_cursor }
    }

    // =========================================================================
    // PageAccumulator
    // =========================================================================

    #[test]
    fn test_new_is_empty() {
        let acc = PageAccumulator::new(12);
        assert_eq!(acc.state(), FeedState::Empty);
        assert!(acc.items().is_empty());
        assert_eq!(acc.generation(), 0);
    }

    #[test]
    fn test_full_page_then_short_page() {
        let mut acc = PageAccumulator::new(12);
        let ticket = acc.reset(FilterSortSpec::default());
        assert_eq!(acc.state(), FeedState::Loading);
        assert!(acc.has_more());

        let outcome = acc.complete(&ticket, page(12));
        assert_eq!(outcome, FetchOutcome::Appended { added: 12, has_more: true });
        assert_eq!(acc.state(), FeedState::Ready);

        let ticket = acc.begin_fetch().unwrap();
        assert_eq!(acc.state(), FeedState::LoadingMore);
        assert_eq!(ticket.query.start_after, acc.cursor().cloned());

        let outcome = acc.complete(&ticket, page(5));
        assert_eq!(outcome, FetchOutcome::Appended { added: 5, has_more: false });
        assert_eq!(acc.items().len(), 17);
        assert_eq!(acc.state(), FeedState::Exhausted);
        assert!(acc.begin_fetch().is_none());
    }

    #[test]
    fn test_second_begin_while_loading_is_noop() {
        let mut acc = PageAccumulator::new(12);
        let first = acc.reset(FilterSortSpec::default());
        assert!(acc.begin_fetch().is_none());

        acc.complete(&first, page(12));
        let _next = acc.begin_fetch().unwrap();
        assert!(acc.begin_fetch().is_none());
        assert_eq!(acc.state(), FeedState::LoadingMore);
        assert_eq!(acc.items().len(), 12);
    }

    #[test]
    fn test_page_from_previous_generation_is_stale() {
        let mut acc = PageAccumulator::new(12);
        let old = acc.reset(FilterSortSpec::default());
        let new = acc.reset(FilterSortSpec::default().with_sort(SortKey::PriceAsc));

        assert_eq!(acc.complete(&old, page(12)), FetchOutcome::Stale);
        assert!(acc.items().is_empty());
        assert_eq!(acc.state(), FeedState::Loading);

        assert!(matches!(acc.complete(&new, page(3)), FetchOutcome::Appended { .. }));
        assert_eq!(acc.items().len(), 3);
    }

    #[test]
    fn test_failure_from_previous_generation_is_stale() {
        let mut acc = PageAccumulator::new(12);
        let old = acc.reset(FilterSortSpec::default());
        let new = acc.reset(FilterSortSpec::default().with_sort(SortKey::Rating));

        assert_eq!(acc.fail(&old), FetchOutcome::Stale);
        assert_eq!(acc.state(), FeedState::Loading);
        assert!(acc.begin_fetch().is_none());

        assert!(matches!(acc.complete(&new, page(12)), FetchOutcome::Appended { .. }));
        assert_eq!(acc.state(), FeedState::Ready);
    }

    #[test]
    fn test_duplicate_completion_is_stale() {
        let mut acc = PageAccumulator::new(12);
        let ticket = acc.reset(FilterSortSpec::default());
        acc.complete(&ticket, page(12));
        assert_eq!(acc.complete(&ticket, page(12)), FetchOutcome::Stale);
        assert_eq!(acc.items().len(), 12);
    }

    #[test]
    fn test_reset_discards_items_and_cursor() {
        let mut acc = PageAccumulator::new(12);
        let ticket = acc.reset(FilterSortSpec::default());
        acc.complete(&ticket, page(12));
        assert!(acc.cursor().is_some());

        let ticket = acc.reset(FilterSortSpec::default().with_featured(true));
        assert!(acc.items().is_empty());
        assert!(acc.cursor().is_none());
        assert!(acc.has_more());
        assert!(ticket.query.start_after.is_none());
    }

    #[test]
    fn test_failed_initial_load_is_retryable() {
        let mut acc = PageAccumulator::new(12);
        let ticket = acc.reset(FilterSortSpec::default());

        assert_eq!(acc.fail(&ticket), FetchOutcome::Failed);
        assert_eq!(acc.state(), FeedState::Ready);
        assert!(acc.cursor().is_none());

        let retry = acc.begin_fetch().unwrap();
        assert!(retry.query.start_after.is_none());
        assert_eq!(retry.generation, ticket.generation);
    }

    #[test]
    fn test_empty_page_keeps_cursor() {
        let mut acc = PageAccumulator::new(12);
        let ticket = acc.reset(FilterSortSpec::default());
        acc.complete(&ticket, page(12));
        let cursor = acc.cursor().cloned();

        let ticket = acc.begin_fetch().unwrap();
        acc.complete(&ticket, CatalogPage::default());
        assert_eq!(acc.cursor().cloned(), cursor);
        assert_eq!(acc.state(), FeedState::Exhausted);
    }

    // =========================================================================
    // CatalogFeed
    // =========================================================================

    #[tokio::test]
    async fn test_feed_pages_through_catalog() {
        let feed = CatalogFeed::new(MemoryCatalog::new(items(17)), 12);

        let first = feed.apply_spec(FilterSortSpec::default()).await.unwrap();
        assert_eq!(first, FetchOutcome::Appended { added: 12, has_more: true });

        let second = feed.fetch_next().await.unwrap();
        assert_eq!(second, FetchOutcome::Appended { added: 5, has_more: false });

        assert_eq!(feed.fetch_next().await.unwrap(), FetchOutcome::Skipped);
        assert_eq!(feed.state().unwrap(), FeedState::Exhausted);

        let ids: Vec<String> = feed
            .items()
            .unwrap()
            .iter()
            .map(|i| i.id.to_string())
            .collect();
        let unique: std::collections::BTreeSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 17);
        assert_eq!(ids.first().map(String::as_str), Some("p016"));
    }

    #[tokio::test]
    async fn test_feed_failure_then_retry() {
        let feed = CatalogFeed::new(MemoryCatalog::new(items(30)), 12);
        feed.apply_spec(FilterSortSpec::default()).await.unwrap();

        feed.catalog().fail_next(1);
        assert!(feed.fetch_next().await.is_err());
        assert_eq!(feed.state().unwrap(), FeedState::Ready);
        assert_eq!(feed.items().unwrap().len(), 12);

        feed.fetch_next().await.unwrap();
        assert_eq!(feed.items().unwrap().len(), 24);
    }

    #[tokio::test]
    async fn test_feed_failed_initial_load() {
        let feed = CatalogFeed::new(MemoryCatalog::new(items(3)), 12);
        feed.catalog().fail_next(1);

        assert!(feed.apply_spec(FilterSortSpec::default()).await.is_err());
        assert!(feed.has_more().unwrap());
        assert!(feed.items().unwrap().is_empty());

        let outcome = feed.fetch_next().await.unwrap();
        assert_eq!(outcome, FetchOutcome::Appended { added: 3, has_more: false });
    }
}
