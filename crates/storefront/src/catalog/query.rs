//! Query composition.
//!
//! [`compose`] turns a [`FilterSortSpec`] and an optional cursor into a
//! [`QueryDescriptor`]: a backend-neutral list of predicates, one ordering
//! clause, a page size and a resume point. The same inputs always produce
//! the same descriptor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cursor::PageCursor;
use super::spec::{FilterSortSpec, SortKey, TypeFilter};

/// Catalog document fields a query can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Brand,
    Category,
    Price,
    SearchKeywords,
    Featured,
    HasDecant,
    HasFullBottle,
    CreatedAt,
    SoldCount,
    Rating,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// The single ordering clause of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: Field,
    pub direction: Direction,
}

impl OrderBy {
    /// Ordering clause for a sort key.
    #[must_use]
    pub const fn for_sort(key: SortKey) -> Self {
        let (field, direction) = match key {
            SortKey::NameAsc => (Field::Name, Direction::Asc),
            SortKey::NameDesc => (Field::Name, Direction::Desc),
            SortKey::PriceAsc => (Field::Price, Direction::Asc),
            SortKey::PriceDesc => (Field::Price, Direction::Desc),
            SortKey::Newest => (Field::CreatedAt, Direction::Desc),
            SortKey::Bestselling => (Field::SoldCount, Direction::Desc),
            SortKey::Rating => (Field::Rating, Direction::Desc),
        };
        Self { field, direction }
    }
}

/// Value side of an equality predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

/// One filter clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// `field == value`
    Eq { field: Field, value: FieldValue },
    /// `field` is one of `values`
    In { field: Field, values: Vec<String> },
    /// `min <= field <= max`
    Range {
        field: Field,
        min: Decimal,
        max: Decimal,
    },
    /// Array `field` contains `value`
    Contains { field: Field, value: String },
}

impl Predicate {
    /// Field the predicate constrains.
    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::Eq { field, .. }
            | Self::In { field, .. }
            | Self::Range { field, .. }
            | Self::Contains { field, .. } => *field,
        }
    }
}

/// A fully composed catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub predicates: Vec<Predicate>,
    pub order_by: OrderBy,
    pub limit: u32,
    pub start_after: Option<PageCursor>,
}

impl QueryDescriptor {
    /// Number of "member of set" predicates.
    ///
    /// Some backends serve at most one of these per query; the composer
    /// still emits one per non-empty set.
    #[must_use]
    pub fn multi_valued_predicate_count(&self) -> usize {
        self.predicates
            .iter()
            .filter(|p| matches!(p, Predicate::In { .. }))
            .count()
    }

    /// Whether a range predicate targets a field other than the ordering
    /// field. How a backend handles this is backend-defined.
    #[must_use]
    pub fn range_field_differs_from_ordering(&self) -> bool {
        self.predicates
            .iter()
            .any(|p| matches!(p, Predicate::Range { field, .. } if *field != self.order_by.field))
    }

    /// Whether the query filters by a search term.
    #[must_use]
    pub fn is_search(&self) -> bool {
        self.predicates
            .iter()
            .any(|p| matches!(p, Predicate::Contains { field: Field::SearchKeywords, .. }))
    }

    /// Stable cache key for this query, or `None` if it should not be
    /// cached (search queries).
    #[must_use]
    pub fn cache_key(&self) -> Option<String> {
        if self.is_search() {
            return None;
        }
        serde_json::to_string(self).ok()
    }
}

/// Compose the query for one page of `spec`.
///
/// Predicates are emitted in a fixed order: search, categories, brands,
/// featured, type, price. The price range is always present and spans
/// `0..=Decimal::MAX` for unset bounds. Bounds are passed through as given,
/// so an inverted range matches nothing.
#[must_use]
pub fn compose(spec: &FilterSortSpec, cursor: Option<&PageCursor>, page_size: u32) -> QueryDescriptor {
    let mut predicates = Vec::new();

    if let Some(term) = spec.normalized_search() {
        predicates.push(Predicate::Contains {
            field: Field::SearchKeywords,
            value: term,
        });
    }

    if !spec.categories.is_empty() {
        predicates.push(Predicate::In {
            field: Field::Category,
            values: spec.categories.iter().cloned().collect(),
        });
    }

    if !spec.brands.is_empty() {
        predicates.push(Predicate::In {
            field: Field::Brand,
            values: spec.brands.iter().cloned().collect(),
        });
    }

    if spec.featured {
        predicates.push(Predicate::Eq {
            field: Field::Featured,
            value: FieldValue::Bool(true),
        });
    }

    match spec.type_filter {
        Some(TypeFilter::Decant) => predicates.push(Predicate::Eq {
            field: Field::HasDecant,
            value: FieldValue::Bool(true),
        }),
        Some(TypeFilter::FullBottle) => predicates.push(Predicate::Eq {
            field: Field::HasFullBottle,
            value: FieldValue::Bool(true),
        }),
        None => {}
    }

    predicates.push(Predicate::Range {
        field: Field::Price,
        min: spec.price_min.unwrap_or(Decimal::ZERO),
        max: spec.price_max.unwrap_or(Decimal::MAX),
    });

    let query = QueryDescriptor {
        predicates,
        order_by: OrderBy::for_sort(spec.sort_key),
        limit: page_size,
        start_after: cursor.cloned(),
    };

    if query.multi_valued_predicate_count() > 1 {
        debug!(
            count = query.multi_valued_predicate_count(),
            "Query has more than one set-membership predicate"
        );
    }
    if query.range_field_differs_from_ordering() {
        debug!(order_by = ?query.order_by.field, "Range predicate field differs from ordering field");
    }

    query
}
