//! Client-side shopping cart.
//!
//! [`CartAggregator`] owns the ordered line sequence for one session. It is
//! constructed once, restored from a [`CartStore`], and passed by reference
//! to whatever needs it. Every mutation rewrites the full snapshot to the
//! store, so a crash loses at most the operation in flight. The cart's
//! monetary total always fits in a `Decimal`: mutations that would push it
//! out of range are refused.
//!
//! # Example
//!
//! ```rust
//! use parfum_core::CurrencyCode;
//! use parfum_storefront::cart::{CartAggregator, LineItem, MemoryCartStore};
//! use rust_decimal::Decimal;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cart = CartAggregator::restore(MemoryCartStore::new(), CurrencyCode::IDR)?;
//! cart.add(LineItem::new("A", "bottle", "Aventus", Decimal::new(500_000, 0), 1))?;
//! cart.add(LineItem::new("A", "bottle", "Aventus", Decimal::new(500_000, 0), 2))?;
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.totals().item_count, 3);
//! # Ok(())
//! # }
//! ```

mod item;
mod store;
mod totals;

pub use item::LineItem;
pub use store::{CartStore, CartStoreError, FileCartStore, MemoryCartStore};
pub use totals::{CartTotals, item_count, total_amount};

use thiserror::Error;
use tracing::{debug, error, warn};

use rust_decimal::Decimal;

use parfum_core::{CurrencyCode, Price, ProductId, VariantKey};

/// Why a cart mutation was refused or not persisted.
#[derive(Debug, Error)]
pub enum CartError {
    /// The resulting total would not fit in a `Decimal`.
    #[error("Cart total exceeds the representable amount")]
    AmountOverflow,

    #[error(transparent)]
    Store(#[from] CartStoreError),
}

/// Owner of the session's cart lines.
#[derive(Debug)]
pub struct CartAggregator<S> {
    items: Vec<LineItem>,
    currency: CurrencyCode,
    store: S,
}

impl<S: CartStore> CartAggregator<S> {
    /// Restore the cart from `store`.
    ///
    /// A missing snapshot yields an empty cart. A corrupt snapshot is logged
    /// and also yields an empty cart; the next mutation overwrites it. So
    /// does a snapshot whose total cannot be represented. Restored lines
    /// are normalized: duplicate keys are merged in first-seen order and
    /// zero quantities are lifted to 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read at all.
    pub fn restore(store: S, currency: CurrencyCode) -> Result<Self, CartStoreError> {
        let items = match store.load() {
            Ok(Some(items)) => {
                let items = normalize(items);
                if total_amount(&items).is_none() {
                    warn!(
                        lines = items.len(),
                        "Discarding cart snapshot with unrepresentable total"
                    );
                    Vec::new()
                } else {
                    items
                }
            }
            Ok(None) => Vec::new(),
            Err(CartStoreError::Corrupt(reason)) => {
                warn!(%reason, "Discarding unreadable cart snapshot");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        debug!(lines = items.len(), "Cart restored");

        Ok(Self {
            items,
            currency,
            store,
        })
    }

    /// Add a line, merging into an existing line with the same key.
    ///
    /// Merging increments the existing quantity (saturating); otherwise the
    /// line is appended at the end. Stock ceilings are not applied here.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AmountOverflow`, leaving the cart unchanged, if
    /// the new total would not be representable. Returns `CartError::Store`
    /// if the snapshot could not be persisted; the in-memory cart has
    /// already been updated in that case.
    pub fn add(&mut self, item: LineItem) -> Result<(), CartError> {
        let mut next = self.items.clone();
        if let Some(existing) = next
            .iter_mut()
            .find(|line| line.matches(&item.product_id, &item.variant))
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            debug!(
                product_id = %item.product_id,
                variant = %item.variant,
                quantity = existing.quantity,
                "Merged cart line"
            );
        } else {
            debug!(product_id = %item.product_id, variant = %item.variant, "Appended cart line");
            let mut item = item;
            item.quantity = item.quantity.max(1);
            next.push(item);
        }
        self.commit(next)
    }

    /// Remove the line with the given key. Absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be persisted, or if the
    /// remaining lines' total would not be representable.
    pub fn remove(
        &mut self,
        product_id: &ProductId,
        variant: &VariantKey,
    ) -> Result<(), CartError> {
        if self.get(product_id, variant).is_none() {
            return Ok(());
        }
        let next = self
            .items
            .iter()
            .filter(|line| !line.matches(product_id, variant))
            .cloned()
            .collect();
        self.commit(next)
    }

    /// Set a line's quantity to `max(1, quantity)`. Absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AmountOverflow`, leaving the cart unchanged, if
    /// the new total would not be representable, or `CartError::Store` if
    /// the snapshot could not be persisted.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        variant: &VariantKey,
        quantity: i64,
    ) -> Result<(), CartError> {
        let mut next = self.items.clone();
        let Some(line) = next
            .iter_mut()
            .find(|line| line.matches(product_id, variant))
        else {
            return Ok(());
        };
        line.quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        self.commit(next)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.items.clear();
        Ok(self.persist()?)
    }

    /// A detached copy of the current lines.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.items.clone()
    }

    /// Borrow the current lines.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up one line.
    #[must_use]
    pub fn get(&self, product_id: &ProductId, variant: &VariantKey) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|line| line.matches(product_id, variant))
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store currency all line prices are expressed in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Item count and total, recomputed from the current lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            item_count: item_count(&self.items),
            // Every accepted mutation keeps the sum in range.
            total: Price::new(
                total_amount(&self.items).unwrap_or(Decimal::MAX),
                self.currency,
            ),
        }
    }

    /// Borrow the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Replace the lines with `next` if its total is representable, then
    /// persist.
    fn commit(&mut self, next: Vec<LineItem>) -> Result<(), CartError> {
        if total_amount(&next).is_none() {
            warn!(
                lines = next.len(),
                "Refusing cart change with unrepresentable total"
            );
            return Err(CartError::AmountOverflow);
        }
        self.items = next;
        Ok(self.persist()?)
    }

    fn persist(&self) -> Result<(), CartStoreError> {
        self.store.save(&self.items).inspect_err(|e| {
            error!(error = %e, lines = self.items.len(), "Failed to persist cart");
        })
    }
}

fn normalize(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    for mut item in items {
        item.quantity = item.quantity.max(1);
        if let Some(existing) = merged
            .iter_mut()
            .find(|line| line.matches(&item.product_id, &item.variant))
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            merged.push(item);
        }
    }
    merged
}
