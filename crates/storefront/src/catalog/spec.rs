//! Filter and sort selections for a catalog listing.
//!
//! A [`FilterSortSpec`] is a plain value: every change produces a new spec,
//! and a new spec means a fresh result list.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::query::{QueryDescriptor, compose};

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
    Bestselling,
    Rating,
}

impl SortKey {
    /// All sort keys, in the order they are offered to shoppers.
    pub const ALL: [Self; 7] = [
        Self::Newest,
        Self::Bestselling,
        Self::Rating,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
        Self::NameDesc,
    ];

    /// Kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
            Self::Bestselling => "bestselling",
            Self::Rating => "rating",
        }
    }

    /// Parse a sort key, falling back to [`SortKey::Newest`].
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            debug!(sort = %s, "Unknown sort key, using newest");
            Self::default()
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "price-asc" | "priceAsc" => Ok(Self::PriceAsc),
            "price-desc" | "priceDesc" => Ok(Self::PriceDesc),
            "newest" => Ok(Self::Newest),
            "bestselling" => Ok(Self::Bestselling),
            "rating" => Ok(Self::Rating),
            _ => Err(format!("unknown sort key: {s}")),
        }
    }
}

/// Which purchasable form a listing is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    FullBottle,
    Decant,
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fullbottle" => Ok(Self::FullBottle),
            "decant" => Ok(Self::Decant),
            _ => Err(format!("unknown product type: {s}")),
        }
    }
}

/// Complete description of one catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSortSpec {
    pub categories: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search_term: Option<String>,
    pub sort_key: SortKey,
    pub type_filter: Option<TypeFilter>,
    pub featured: bool,
}

/// A fixed home-page listing: a spec plus how many items it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shelf {
    pub spec: FilterSortSpec,
    pub size: u32,
}

impl Shelf {
    /// The single query that fills this shelf.
    #[must_use]
    pub fn query(&self) -> QueryDescriptor {
        compose(&self.spec, None, self.size)
    }
}

impl FilterSortSpec {
    /// Featured products, four of them.
    #[must_use]
    pub fn featured_shelf() -> Shelf {
        Shelf {
            spec: Self::default().with_featured(true),
            size: 4,
        }
    }

    /// The eight most recently added products.
    #[must_use]
    pub fn new_arrivals() -> Shelf {
        Shelf {
            spec: Self::default().with_sort(SortKey::Newest),
            size: 8,
        }
    }

    /// The four best-selling products.
    #[must_use]
    pub fn best_sellers() -> Shelf {
        Shelf {
            spec: Self::default().with_sort(SortKey::Bestselling),
            size: 4,
        }
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, key: SortKey) -> Self {
        self.sort_key = key;
        self
    }

    #[must_use]
    pub const fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    #[must_use]
    pub const fn with_type_filter(mut self, filter: Option<TypeFilter>) -> Self {
        self.type_filter = filter;
        self
    }

    #[must_use]
    pub const fn with_price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    /// Add `category` if absent, remove it if present.
    #[must_use]
    pub fn with_category_toggled(mut self, category: impl Into<String>) -> Self {
        toggle(&mut self.categories, category.into());
        self
    }

    /// Add `brand` if absent, remove it if present.
    #[must_use]
    pub fn with_brand_toggled(mut self, brand: impl Into<String>) -> Self {
        toggle(&mut self.brands, brand.into());
        self
    }

    /// Clear every filter except the search term, and restore the default
    /// sort.
    #[must_use]
    pub fn reset_filters(self) -> Self {
        Self {
            search_term: self.search_term,
            ..Self::default()
        }
    }

    /// Trimmed, lowercased search term, or `None` if blank.
    #[must_use]
    pub fn normalized_search(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

fn toggle(set: &mut BTreeSet<String>, value: String) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

// =============================================================================
// URL listing parameters
// =============================================================================

/// Listing parameters as they arrive in a storefront URL query.
///
/// Every value is optional and an empty value counts as unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub sort: Option<String>,
    pub featured: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_price(name: &str, value: Option<&str>) -> Option<Decimal> {
    let raw = non_empty(value)?;
    raw.parse()
        .inspect_err(|e| debug!(param = name, value = raw, error = %e, "Ignoring invalid price"))
        .ok()
}

impl From<&ListingParams> for FilterSortSpec {
    fn from(params: &ListingParams) -> Self {
        let mut spec = Self::default();

        if let Some(search) = non_empty(params.search.as_deref()) {
            spec.search_term = Some(search.to_string());
        }
        if let Some(category) = non_empty(params.category.as_deref()) {
            spec.categories.insert(category.to_string());
        }
        if let Some(brand) = non_empty(params.brand.as_deref()) {
            spec.brands.insert(brand.to_string());
        }
        spec.type_filter = non_empty(params.product_type.as_deref()).and_then(|t| t.parse().ok());
        if let Some(sort) = non_empty(params.sort.as_deref()) {
            spec.sort_key = SortKey::parse_or_default(sort);
        }
        spec.featured = non_empty(params.featured.as_deref()) == Some("true");
        spec.price_min = parse_price("minPrice", params.min_price.as_deref());
        spec.price_max = parse_price("maxPrice", params.max_price.as_deref());

        spec
    }
}
