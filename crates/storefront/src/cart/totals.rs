//! Derived cart totals.
//!
//! Always recomputed from a snapshot, never cached, so they cannot drift
//! from the lines they describe.

use rust_decimal::Decimal;
use serde::Serialize;

use parfum_core::{CurrencyCode, Price};

use super::LineItem;

/// Sum of quantities over `items`.
#[must_use]
pub fn item_count(items: &[LineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Sum of `unit_price × quantity` over `items`.
///
/// `None` when any line or the running sum leaves the range of `Decimal`.
#[must_use]
pub fn total_amount(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
}

/// Item count and monetary total for one cart snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: u64,
    pub total: Price,
}

impl CartTotals {
    /// Compute totals for `items` priced in `currency`.
    ///
    /// `None` when the monetary total cannot be represented.
    #[must_use]
    pub fn from_items(items: &[LineItem], currency: CurrencyCode) -> Option<Self> {
        Some(Self {
            item_count: item_count(items),
            total: Price::new(total_amount(items)?, currency),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_totals() {
        let totals = CartTotals::from_items(&[], CurrencyCode::IDR).unwrap();
        assert_eq!(totals.item_count, 0);
        assert!(totals.total.is_zero());
    }

    #[test]
    fn test_totals_over_lines() {
        let items = vec![
            LineItem::new("A", "bottle", "A", Decimal::new(500_000, 0), 3),
            LineItem::new("B", "decant5ml", "B", Decimal::new(75_000, 0), 2),
        ];
        let totals = CartTotals::from_items(&items, CurrencyCode::IDR).unwrap();
        assert_eq!(totals.item_count, 5);
        assert_eq!(totals.total.amount, Decimal::new(1_650_000, 0));
        assert_eq!(totals.total.display(), "Rp1.650.000");
    }

    #[test]
    fn test_overflowing_sum_has_no_total() {
        let items = vec![
            LineItem::new("A", "bottle", "A", Decimal::MAX, 1),
            LineItem::new("B", "bottle", "B", Decimal::ONE, 1),
        ];
        assert_eq!(total_amount(&items), None);
        assert_eq!(CartTotals::from_items(&items, CurrencyCode::IDR), None);
        assert_eq!(total_amount(&items[..1]), Some(Decimal::MAX));
    }
}
