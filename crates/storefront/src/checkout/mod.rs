//! Checkout: turning a cart snapshot into a submitted order.
//!
//! [`draft`] validates the checkout form against a cart snapshot and the
//! signed-in user and produces an immutable [`OrderDraft`].
//! [`Checkout::submit`] consumes the draft, hands it to an [`OrderStore`]
//! and clears the cart once the store has accepted it. If the store fails,
//! the cart is untouched and the draft comes back inside the error for a
//! retry.

mod orders;

pub use orders::{MemoryOrderStore, Order, OrderStats, OrderStore, OrderStoreError};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use parfum_core::{CurrencyCode, NonBlank, OrderId, Price, TextError, UserId};

use crate::cart::{CartAggregator, CartStore, LineItem, total_amount};
use crate::session::SessionUser;

// =============================================================================
// Checkout choices
// =============================================================================

/// Courier offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Jne,
    Jnt,
    Sicepat,
    Ninja,
}

impl ShippingMethod {
    /// Name shown to the shopper.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Jne => "JNE Reguler",
            Self::Jnt => "JNT Express",
            Self::Sicepat => "SiCepat",
            Self::Ninja => "Ninja Express",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShippingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jne" => Ok(Self::Jne),
            "jnt" => Ok(Self::Jnt),
            "sicepat" => Ok(Self::Sicepat),
            "ninja" => Ok(Self::Ninja),
            _ => Err(format!("unknown shipping method: {s}")),
        }
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Bank transfer.
    #[default]
    Transfer,
    Qris,
    /// Cash on delivery.
    Cod,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "transfer"),
            Self::Qris => write!(f, "qris"),
            Self::Cod => write!(f, "cod"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(Self::Transfer),
            "qris" => Ok(Self::Qris),
            "cod" => Ok(Self::Cod),
            _ => Err(format!("unknown payment method: {s}")),
        }
    }
}

// =============================================================================
// Form and draft
// =============================================================================

/// Checkout form input, as typed by the shopper.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: String,
}

/// Validated delivery details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub name: NonBlank,
    pub phone: NonBlank,
    pub address: NonBlank,
    pub city: NonBlank,
    pub postal_code: NonBlank,
    pub method: ShippingMethod,
}

/// Who an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub user_id: UserId,
    pub email: String,
}

impl From<&SessionUser> for Customer {
    fn from(user: &SessionUser) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
        }
    }
}

/// Why a draft could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: TextError,
    },

    #[error("No signed-in user")]
    MissingIdentity,

    #[error("Order total exceeds the representable amount")]
    AmountOverflow,
}

fn required(field: &'static str, value: &str) -> Result<NonBlank, ValidationError> {
    NonBlank::parse(value).map_err(|e| match e {
        TextError::Blank => ValidationError::MissingField(field),
        source @ TextError::TooLong { .. } => ValidationError::InvalidField { field, source },
    })
}

/// An order ready to be submitted.
///
/// Built once by [`draft`] and consumed by [`Checkout::submit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    customer: Customer,
    line_items: Vec<LineItem>,
    total: Price,
    shipping: ShippingInfo,
    payment_method: PaymentMethod,
    notes: String,
}

impl OrderDraft {
    #[must_use]
    pub const fn customer(&self) -> &Customer {
        &self.customer
    }

    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }
}

/// Build an order draft from a cart snapshot.
///
/// # Errors
///
/// Returns `ValidationError::EmptyCart` for an empty snapshot,
/// `ValidationError::MissingIdentity` when nobody is signed in, and
/// `ValidationError::MissingField` for the first blank required field
/// (name, phone, address, city, postal code, in that order). A snapshot
/// whose total does not fit in a `Decimal` yields
/// `ValidationError::AmountOverflow`.
pub fn draft(
    snapshot: Vec<LineItem>,
    currency: CurrencyCode,
    form: &CheckoutForm,
    user: Option<&SessionUser>,
) -> Result<OrderDraft, ValidationError> {
    if snapshot.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    let user = user.ok_or(ValidationError::MissingIdentity)?;

    let shipping = ShippingInfo {
        name: required("name", &form.name)?,
        phone: required("phone", &form.phone)?,
        address: required("address", &form.address)?,
        city: required("city", &form.city)?,
        postal_code: required("postalCode", &form.postal_code)?,
        method: form.shipping_method,
    };

    let total = total_amount(&snapshot).ok_or(ValidationError::AmountOverflow)?;

    Ok(OrderDraft {
        customer: Customer::from(user),
        total: Price::new(total, currency),
        line_items: snapshot,
        shipping,
        payment_method: form.payment_method,
        notes: form.notes.trim().to_string(),
    })
}

// =============================================================================
// Submission
// =============================================================================

/// A rejected submission. Carries the draft back so it can be retried.
#[derive(Debug, Error)]
#[error("Order submission failed: {source}")]
pub struct SubmitError {
    pub draft: Box<OrderDraft>,
    #[source]
    pub source: OrderStoreError,
}

impl SubmitError {
    /// Take back the draft for another attempt.
    #[must_use]
    pub fn into_draft(self) -> OrderDraft {
        *self.draft
    }
}

/// Submits drafts to an order store.
#[derive(Debug)]
pub struct Checkout<S> {
    orders: S,
}

impl<S: OrderStore> Checkout<S> {
    #[must_use]
    pub const fn new(orders: S) -> Self {
        Self { orders }
    }

    /// The order store.
    #[must_use]
    pub const fn orders(&self) -> &S {
        &self.orders
    }

    /// Submit `draft` and clear `cart` once the order is stored.
    ///
    /// A failure to persist the cleared cart is logged but does not fail
    /// the submission: the order exists and the in-memory cart is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmitError`] holding the draft if the store rejects
    /// it. The cart is not modified in that case.
    #[instrument(skip_all, fields(user_id = %draft.customer.user_id, lines = draft.line_items.len()))]
    pub async fn submit<C: CartStore>(
        &self,
        draft: OrderDraft,
        cart: &mut CartAggregator<C>,
    ) -> Result<OrderId, SubmitError> {
        let id = match self.orders.create(&draft).await {
            Ok(id) => id,
            Err(source) => {
                warn!(error = %source, "Order submission failed, keeping cart");
                return Err(SubmitError {
                    draft: Box::new(draft),
                    source,
                });
            }
        };

        info!(order_id = %id, total = %draft.total.display(), "Order submitted");

        if let Err(e) = cart.clear() {
            warn!(order_id = %id, error = %e, "Order placed but cleared cart was not persisted");
        }
        Ok(id)
    }
}
