//! Checkout commands.

use clap::Subcommand;

use parfum_storefront::StorefrontConfig;
use parfum_storefront::cart::CartAggregator;
use parfum_storefront::checkout::{self, CheckoutForm, PaymentMethod, ShippingMethod};
use parfum_storefront::session::{Identity, LocalSession, SessionUser};

use super::{CommandError, out_json};

#[derive(Subcommand)]
pub enum CheckoutAction {
    /// Print the order draft for the current cart without submitting it
    Draft {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        email: String,
        /// Recipient name
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        postal_code: String,
        /// jne, jnt, sicepat or ninja
        #[arg(long, default_value = "jne")]
        shipping: ShippingMethod,
        /// transfer, qris or cod
        #[arg(long, default_value = "transfer")]
        payment: PaymentMethod,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

/// Run a checkout command.
///
/// # Errors
///
/// Returns an error if the cart cannot be read or the draft is invalid.
pub fn run(config: &StorefrontConfig, action: CheckoutAction) -> Result<(), CommandError> {
    let CheckoutAction::Draft {
        user_id,
        email,
        name,
        phone,
        address,
        city,
        postal_code,
        shipping,
        payment,
        notes,
    } = action;

    let session = LocalSession::signed_in(SessionUser::new(user_id, email));
    let cart = CartAggregator::restore(config.cart.store(), config.currency)?;

    let form = CheckoutForm {
        name,
        phone,
        address,
        city,
        postal_code,
        shipping_method: shipping,
        payment_method: payment,
        notes,
    };

    let draft = checkout::draft(
        cart.snapshot(),
        cart.currency(),
        &form,
        session.current_user().as_ref(),
    )?;
    out_json(&draft)
}
