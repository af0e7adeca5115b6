//! The cart line value type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parfum_core::{ProductId, VariantKey};

/// One cart entry: a product variant, its unit price and requested quantity.
///
/// Lines are unique by `(product_id, variant)`. The quantity is always at
/// least 1 once a line is inside a cart; the stock ceiling is advisory and
/// only applied when a caller asks for it via [`LineItem::clamped_to_stock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Catalog product the line refers to.
    pub product_id: ProductId,
    /// Which purchasable form of the product (bottle, decant, ...).
    pub variant: VariantKey,
    /// Human readable variant name, e.g. "Botol 100ml".
    pub variant_label: String,
    /// Price of one unit in the store currency.
    pub unit_price: Decimal,
    /// Requested quantity.
    pub quantity: u32,
    /// Units in stock when the line was added, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_ceiling: Option<u32>,
    /// Image reference for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Product display name.
    pub name: String,
}

impl LineItem {
    /// Create a line with no stock ceiling and no image.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        variant: impl Into<VariantKey>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant: variant.into(),
            variant_label: String::new(),
            unit_price,
            quantity,
            stock_ceiling: None,
            image: None,
            name: name.into(),
        }
    }

    /// Set the variant label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.variant_label = label.into();
        self
    }

    /// Set the stock ceiling.
    #[must_use]
    pub const fn with_stock(mut self, stock: u32) -> Self {
        self.stock_ceiling = Some(stock);
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Whether this line has the given identity.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, variant: &VariantKey) -> bool {
        self.product_id == *product_id && self.variant == *variant
    }

    /// `unit_price × quantity`, or `None` if the product overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    /// Copy of this line with its quantity capped at the known stock.
    ///
    /// The lower bound of 1 still wins over a stock ceiling of 0; callers
    /// that need to refuse out-of-stock variants must check
    /// `stock_ceiling` themselves.
    #[must_use]
    pub fn clamped_to_stock(&self) -> Self {
        let mut line = self.clone();
        if let Some(stock) = self.stock_ceiling {
            line.quantity = line.quantity.min(stock).max(1);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bottle(quantity: u32) -> LineItem {
        LineItem::new("A", VariantKey::BOTTLE, "Aventus", Decimal::new(500_000, 0), quantity)
            .with_label("Botol 100ml")
    }

    #[test]
    fn test_line_total() {
        assert_eq!(bottle(3).line_total(), Some(Decimal::new(1_500_000, 0)));
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        let line = LineItem::new("A", VariantKey::BOTTLE, "Aventus", Decimal::MAX, 2);
        assert_eq!(line.line_total(), None);
    }

    #[test]
    fn test_clamped_to_stock() {
        let line = bottle(10).with_stock(4).clamped_to_stock();
        assert_eq!(line.quantity, 4);
    }

    #[test]
    fn test_clamped_to_stock_keeps_lower_bound() {
        let line = bottle(2).with_stock(0).clamped_to_stock();
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn test_clamp_without_ceiling_is_identity() {
        let line = bottle(7);
        assert_eq!(line.clamped_to_stock(), line);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(bottle(1).with_stock(5)).unwrap_or_default();
        assert_eq!(json["productId"], "A");
        assert_eq!(json["variantLabel"], "Botol 100ml");
        assert_eq!(json["stockCeiling"], 5);
        assert!(json.get("image").is_none());
    }
}
