//! In-process catalog over a fixed set of items.

use std::cmp;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, instrument};

use super::cursor::{PageCursor, SortValue};
use super::query::{Direction, FieldValue, Predicate, QueryDescriptor};
use super::{Catalog, CatalogError, CatalogItem, CatalogPage};

/// Evaluates queries against items held in memory.
///
/// Supports every predicate combination a descriptor can express, including
/// several set-membership predicates and range filters on a field other than
/// the ordering field.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: Vec<CatalogItem>,
    fail_next: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Load items from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not an array of catalog items.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load items from a JSON fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Make the next `n` fetches fail with `CatalogError::Unavailable`.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Number of fetches answered so far, failed ones included.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn run(&self, query: &QueryDescriptor) -> Result<CatalogPage, CatalogError> {
        let field = query.order_by.field;
        let direction = query.order_by.direction;

        let mut matching: Vec<(SortValue, &CatalogItem)> = self
            .items
            .iter()
            .filter(|item| query.predicates.iter().all(|p| matches_predicate(item, p)))
            .map(|item| (SortValue::of(item, field), item))
            .collect();

        matching.sort_by(|(av, a), (bv, b)| compare_keys(av, &a.id, bv, &b.id, direction));

        let after = query.start_after.as_ref().map(PageCursor::decode).transpose()?;
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

        let items: Vec<CatalogItem> = matching
            .into_iter()
            .filter(|(value, item)| {
                after.as_ref().is_none_or(|key| {
                    compare_keys(value, &item.id, &key.value, &key.id, direction)
                        == cmp::Ordering::Greater
                })
            })
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect();

        let end_cursor = items
            .last()
            .map(|item| PageCursor::for_item(item, field))
            .transpose()?;

        Ok(CatalogPage { items, end_cursor })
    }
}

impl Catalog for MemoryCatalog {
    #[instrument(skip_all, fields(limit = query.limit, predicates = query.predicates.len()))]
    async fn fetch_page(&self, query: &QueryDescriptor) -> Result<CatalogPage, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(CatalogError::Unavailable("injected failure".to_string()));
        }
        let page = self.run(query)?;
        debug!(returned = page.items.len(), "Memory catalog page");
        Ok(page)
    }
}

/// Order two (value, id) keys. The id tiebreak is always ascending.
fn compare_keys<I: Ord>(
    av: &SortValue,
    a_id: &I,
    bv: &SortValue,
    b_id: &I,
    direction: Direction,
) -> cmp::Ordering {
    let by_value = av.compare(bv).unwrap_or(cmp::Ordering::Equal);
    let by_value = match direction {
        Direction::Asc => by_value,
        Direction::Desc => by_value.reverse(),
    };
    by_value.then_with(|| a_id.cmp(b_id))
}

fn matches_predicate(item: &CatalogItem, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { field, value } => match (SortValue::of(item, *field), value) {
            (SortValue::Count(n), FieldValue::Bool(b)) => (n != 0) == *b,
            (SortValue::Text(text), FieldValue::Text(expected)) => text == *expected,
            _ => false,
        },
        Predicate::In { field, values } => match SortValue::of(item, *field) {
            SortValue::Text(text) => values.contains(&text),
            _ => false,
        },
        Predicate::Range { field, min, max } => match SortValue::of(item, *field) {
            SortValue::Decimal(d) => *min <= d && d <= *max,
            _ => false,
        },
        Predicate::Contains { value, .. } => item.search_keywords.iter().any(|k| k == value),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::{FilterSortSpec, SortKey, TypeFilter, compose};

    fn item(id: &str, price: i64, sold: u64, day: u32) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            name: format!("Scent {id}"),
            brand: if sold % 2 == 0 { "Creed" } else { "Dior" }.to_string(),
            category: if price > 1_000_000 { "Woody" } else { "Fresh" }.to_string(),
            price: Decimal::new(price, 0),
            has_full_bottle: true,
            has_decant: price > 500_000,
            featured: day % 3 == 0,
            sold_count: sold,
            rating: Decimal::new(45, 1),
            created_at: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
            search_keywords: vec![format!("scent {id}").to_lowercase(), "parfum".to_string()],
            image: None,
        }
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(vec![
            item("a", 400_000, 10, 1),
            item("b", 1_200_000, 3, 2),
            item("c", 800_000, 3, 3),
            item("d", 2_500_000, 7, 4),
            item("e", 800_000, 0, 5),
        ])
    }

    fn ids(page: &CatalogPage) -> Vec<&str> {
        page.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_default_is_newest_first() {
        let page = catalog()
            .fetch_page(&compose(&FilterSortSpec::default(), None, 12))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["e", "d", "c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_ties_break_by_id() {
        let spec = FilterSortSpec::default().with_sort(SortKey::PriceAsc);
        let page = catalog().fetch_page(&compose(&spec, None, 12)).await.unwrap();
        assert_eq!(ids(&page), vec!["a", "c", "e", "b", "d"]);

        let spec = FilterSortSpec::default().with_sort(SortKey::Bestselling);
        let page = catalog().fetch_page(&compose(&spec, None, 12)).await.unwrap();
        assert_eq!(ids(&page), vec!["a", "d", "b", "c", "e"]);
    }

    #[tokio::test]
    async fn test_cursor_pages_do_not_overlap() {
        let catalog = catalog();
        let spec = FilterSortSpec::default().with_sort(SortKey::PriceAsc);

        let first = catalog.fetch_page(&compose(&spec, None, 2)).await.unwrap();
        assert_eq!(ids(&first), vec!["a", "c"]);

        let second = catalog
            .fetch_page(&compose(&spec, first.end_cursor.as_ref(), 2))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["e", "b"]);

        let third = catalog
            .fetch_page(&compose(&spec, second.end_cursor.as_ref(), 2))
            .await
            .unwrap();
        assert_eq!(ids(&third), vec!["d"]);

        let empty = catalog
            .fetch_page(&compose(&spec, third.end_cursor.as_ref(), 2))
            .await
            .unwrap();
        assert!(empty.items.is_empty());
        assert!(empty.end_cursor.is_none());
    }

    #[tokio::test]
    async fn test_combined_predicates() {
        let spec = FilterSortSpec::default()
            .with_category_toggled("Fresh")
            .with_brand_toggled("Dior")
            .with_type_filter(Some(TypeFilter::Decant))
            .with_price_range(Some(Decimal::new(500_000, 0)), None);
        let page = catalog().fetch_page(&compose(&spec, None, 12)).await.unwrap();
        assert_eq!(ids(&page), vec!["c"]);
    }

    #[tokio::test]
    async fn test_search_and_featured() {
        let spec = FilterSortSpec::default().with_search("Scent D");
        let page = catalog().fetch_page(&compose(&spec, None, 12)).await.unwrap();
        assert_eq!(ids(&page), vec!["d"]);

        let spec = FilterSortSpec::default().with_featured(true);
        let page = catalog().fetch_page(&compose(&spec, None, 12)).await.unwrap();
        assert_eq!(ids(&page), vec!["c"]);
    }

    #[tokio::test]
    async fn test_inverted_range_matches_nothing() {
        let spec = FilterSortSpec::default()
            .with_price_range(Some(Decimal::new(900_000, 0)), Some(Decimal::new(100, 0)));
        let page = catalog().fetch_page(&compose(&spec, None, 12)).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_featured_shelf() {
        let shelf = FilterSortSpec::featured_shelf();
        let page = catalog().fetch_page(&shelf.query()).await.unwrap();
        assert_eq!(shelf.query().limit, 4);
        assert_eq!(ids(&page), ["c"]);
        assert!(page.items.iter().all(|i| i.featured));
    }

    #[tokio::test]
    async fn test_best_sellers_shelf() {
        let shelf = FilterSortSpec::best_sellers();
        let page = catalog().fetch_page(&shelf.query()).await.unwrap();
        assert_eq!(ids(&page), ["a", "d", "b", "c"]);
    }

    #[tokio::test]
    async fn test_invalid_cursor_is_rejected() {
        let cursor = PageCursor::from_token("nope");
        let query = compose(&FilterSortSpec::default(), Some(&cursor), 12);
        let err = catalog().fetch_page(&query).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let catalog = catalog();
        catalog.fail_next(1);
        let query = compose(&FilterSortSpec::default(), None, 12);

        assert!(catalog.fetch_page(&query).await.is_err());
        assert!(catalog.fetch_page(&query).await.is_ok());
        assert_eq!(catalog.fetch_count(), 2);
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"[{
            "id": "p1",
            "name": "Aventus",
            "brand": "Creed",
            "category": "Men",
            "price": "4500000",
            "createdAt": "2025-03-01T00:00:00Z"
        }]"#;
        let catalog = MemoryCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.items().len(), 1);
        assert!(!catalog.items()[0].has_decant);
    }
}
