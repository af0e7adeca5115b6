//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! parfum cart add --product aventus --variant decant5ml --label "Decant 5ml" \
//!     --name Aventus --price 95000 --quantity 2 --stock 10
//! parfum cart set-quantity --product aventus --variant decant5ml --quantity 3
//! parfum cart remove --product aventus --variant decant5ml
//! parfum cart show --json
//! parfum cart clear
//! ```

use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::json;

use parfum_core::{Price, ProductId, VariantKey};
use parfum_storefront::StorefrontConfig;
use parfum_storefront::cart::{CartAggregator, CartStore, LineItem};

use super::{CommandError, out, out_json};

#[derive(Subcommand)]
pub enum CartAction {
    /// Print cart lines and totals
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a product variant (merges into an existing line)
    Add {
        #[arg(long)]
        product: String,
        #[arg(long)]
        variant: String,
        /// Variant label shown to the shopper
        #[arg(long, default_value = "")]
        label: String,
        /// Product display name
        #[arg(long)]
        name: String,
        /// Unit price in the store currency
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        /// Units in stock; the added quantity is capped to it
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a line
    Remove {
        #[arg(long)]
        product: String,
        #[arg(long)]
        variant: String,
    },
    /// Replace a line's quantity (values below 1 become 1)
    SetQuantity {
        #[arg(long)]
        product: String,
        #[arg(long)]
        variant: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line
    Clear,
}

/// Run a cart command against the configured cart file.
///
/// # Errors
///
/// Returns an error if the cart cannot be read or written.
pub fn run(config: &StorefrontConfig, action: CartAction) -> Result<(), CommandError> {
    let mut cart = CartAggregator::restore(config.cart.store(), config.currency)?;

    match action {
        CartAction::Show { json } => return show(&cart, json),
        CartAction::Add {
            product,
            variant,
            label,
            name,
            price,
            quantity,
            stock,
            image,
        } => {
            let mut item = LineItem::new(product, variant, name, price, quantity).with_label(label);
            if let Some(stock) = stock {
                item = item.with_stock(stock).clamped_to_stock();
            }
            if let Some(image) = image {
                item = item.with_image(image);
            }
            cart.add(item)?;
        }
        CartAction::Remove { product, variant } => {
            cart.remove(&ProductId::new(product), &VariantKey::new(variant))?;
        }
        CartAction::SetQuantity {
            product,
            variant,
            quantity,
        } => {
            cart.set_quantity(&ProductId::new(product), &VariantKey::new(variant), quantity)?;
        }
        CartAction::Clear => cart.clear()?,
    }

    show(&cart, false)
}

fn show<S: CartStore>(cart: &CartAggregator<S>, as_json: bool) -> Result<(), CommandError> {
    let totals = cart.totals();

    if as_json {
        return out_json(&json!({ "items": cart.items(), "totals": totals }));
    }

    if cart.is_empty() {
        out("Cart is empty")?;
        return Ok(());
    }

    for line in cart.items() {
        let label = if line.variant_label.is_empty() {
            line.variant.as_str()
        } else {
            line.variant_label.as_str()
        };
        let line_total = line.line_total().map_or_else(
            || "-".to_string(),
            |amount| Price::new(amount, cart.currency()).display(),
        );
        out(format_args!(
            "{} ({label}) x{} @ {} = {line_total}",
            line.name,
            line.quantity,
            Price::new(line.unit_price, cart.currency()).display(),
        ))?;
    }
    out(format_args!(
        "Items: {}  Total: {}",
        totals.item_count,
        totals.total.display()
    ))
}
