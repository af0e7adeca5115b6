//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! parfum catalog list --catalog catalog.json --brand Creed --brand Dior --type decant
//! parfum catalog list --catalog catalog.json --search oud --sort rating --pages 3
//! ```

use std::path::PathBuf;

use clap::Subcommand;
use rust_decimal::Decimal;
use tracing::info;

use parfum_core::Price;
use parfum_storefront::StorefrontConfig;
use parfum_storefront::catalog::{
    CatalogFeed, FetchOutcome, FilterSortSpec, MemoryCatalog, SortKey, TypeFilter,
};

use super::{CommandError, out};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List products page by page
    List {
        /// JSON array of catalog items
        #[arg(long)]
        catalog: PathBuf,
        /// Category to include (repeatable)
        #[arg(long)]
        category: Vec<String>,
        /// Brand to include (repeatable)
        #[arg(long)]
        brand: Vec<String>,
        #[arg(long)]
        search: Option<String>,
        /// name-asc, name-desc, price-asc, price-desc, newest, bestselling or rating
        #[arg(long)]
        sort: Option<String>,
        /// fullbottle or decant
        #[arg(long = "type")]
        product_type: Option<TypeFilter>,
        /// Only featured products
        #[arg(long)]
        featured: bool,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

/// Run a catalog command.
///
/// # Errors
///
/// Returns an error if the fixture cannot be loaded or a page fetch fails.
pub async fn run(config: &StorefrontConfig, action: CatalogAction) -> Result<(), CommandError> {
    let CatalogAction::List {
        catalog,
        category,
        brand,
        search,
        sort,
        product_type,
        featured,
        min_price,
        max_price,
        pages,
    } = action;

    let mut spec = FilterSortSpec::default()
        .with_featured(featured)
        .with_type_filter(product_type)
        .with_price_range(min_price, max_price);
    spec.categories.extend(category);
    spec.brands.extend(brand);
    if let Some(search) = search {
        spec = spec.with_search(search);
    }
    if let Some(sort) = sort {
        spec = spec.with_sort(SortKey::parse_or_default(&sort));
    }

    let backend = config.catalog.cached(MemoryCatalog::from_path(&catalog)?);
    let feed = CatalogFeed::new(backend, config.catalog.page_size);

    let mut outcome = feed.apply_spec(spec).await?;
    for _ in 1..pages {
        if !matches!(outcome, FetchOutcome::Appended { has_more: true, .. }) {
            break;
        }
        outcome = feed.fetch_next().await?;
    }

    let items = feed.items()?;
    for item in &items {
        out(format_args!(
            "{} | {} | {} | {}",
            item.id,
            item.name,
            item.brand,
            Price::new(item.price, config.currency).display()
        ))?;
    }

    let has_more = feed.has_more()?;
    info!(items = items.len(), has_more, "Listing complete");
    out(format_args!("{} items, more available: {has_more}", items.len()))
}
