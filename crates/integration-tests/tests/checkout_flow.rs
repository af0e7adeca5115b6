//! From cart to stored order.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use parfum_core::{CurrencyCode, OrderStatus, PaymentStatus};
use parfum_storefront::cart::{CartAggregator, LineItem, MemoryCartStore};
use parfum_storefront::checkout::{
    self, Checkout, CheckoutForm, MemoryOrderStore, OrderStore, OrderStoreError, PaymentMethod,
    ShippingMethod, ValidationError,
};
use parfum_storefront::session::{Identity, LocalSession, SessionUser};
use parfum_storefront::AppError;

fn form() -> CheckoutForm {
    CheckoutForm {
        name: "Sari Wulandari".to_string(),
        phone: "081234567890".to_string(),
        address: "Jl. Melati No. 7".to_string(),
        city: "Bandung".to_string(),
        postal_code: "40115".to_string(),
        shipping_method: ShippingMethod::Sicepat,
        payment_method: PaymentMethod::Qris,
        notes: "  Tolong bungkus rapi  ".to_string(),
    }
}

fn session() -> LocalSession {
    LocalSession::signed_in(SessionUser::new("user-1", "sari@example.com"))
}

fn filled_cart() -> CartAggregator<Arc<MemoryCartStore>> {
    let mut cart =
        CartAggregator::restore(Arc::new(MemoryCartStore::new()), CurrencyCode::IDR).unwrap();
    cart.add(LineItem::new("aventus", "fullbottle", "Aventus", Decimal::from(500_000), 2))
        .unwrap();
    cart.add(LineItem::new("aventus", "decant5ml", "Aventus", Decimal::from(95_000), 1))
        .unwrap();
    cart
}

#[test]
fn test_empty_cart_is_rejected_and_left_alone() {
    let store = Arc::new(MemoryCartStore::new());
    let cart = CartAggregator::restore(Arc::clone(&store), CurrencyCode::IDR).unwrap();

    let err = checkout::draft(
        cart.snapshot(),
        cart.currency(),
        &form(),
        session().current_user().as_ref(),
    )
    .unwrap_err();

    assert_eq!(err, ValidationError::EmptyCart);
    assert!(cart.is_empty());
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_logged_out_shopper_cannot_draft() {
    let cart = filled_cart();
    let session = session();
    session.logout();

    let err = checkout::draft(
        cart.snapshot(),
        cart.currency(),
        &form(),
        session.current_user().as_ref(),
    )
    .unwrap_err();
    assert_eq!(err, ValidationError::MissingIdentity);
    assert!(matches!(AppError::from(err), AppError::Validation(_)));
}

#[tokio::test]
async fn test_submit_stores_order_and_clears_cart() {
    let mut cart = filled_cart();
    let checkout = Checkout::new(MemoryOrderStore::new());

    let draft = checkout::draft(
        cart.snapshot(),
        cart.currency(),
        &form(),
        session().current_user().as_ref(),
    )
    .unwrap();
    assert_eq!(draft.total().amount, Decimal::from(1_095_000));

    let id = checkout.submit(draft, &mut cart).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.store().stored_items().unwrap(), Vec::<LineItem>::new());

    let order = checkout.orders().get(&id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.customer.email, "sari@example.com");
    assert_eq!(order.line_items.len(), 2);
    assert_eq!(order.shipping.city.as_str(), "Bandung");
    assert_eq!(order.shipping.method, ShippingMethod::Sicepat);
    assert_eq!(order.payment_method, PaymentMethod::Qris);
    assert_eq!(order.notes, "Tolong bungkus rapi");
}

#[tokio::test]
async fn test_failed_submit_keeps_cart_and_draft() {
    let mut cart = filled_cart();
    let before = cart.snapshot();
    let checkout = Checkout::new(MemoryOrderStore::new());
    checkout.orders().set_fail_writes(true);

    let draft = checkout::draft(
        cart.snapshot(),
        cart.currency(),
        &form(),
        session().current_user().as_ref(),
    )
    .unwrap();
    let expected = draft.clone();

    let err = checkout.submit(draft, &mut cart).await.unwrap_err();
    assert!(matches!(err.source, OrderStoreError::Unavailable(_)));
    assert_eq!(cart.snapshot(), before);

    let draft = err.into_draft();
    assert_eq!(draft, expected);

    checkout.orders().set_fail_writes(false);
    checkout.submit(draft, &mut cart).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(checkout.orders().list_orders(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_status_axes_are_independent() {
    let mut cart = filled_cart();
    let checkout = Checkout::new(MemoryOrderStore::new());
    let draft = checkout::draft(
        cart.snapshot(),
        cart.currency(),
        &form(),
        session().current_user().as_ref(),
    )
    .unwrap();
    let id = checkout.submit(draft, &mut cart).await.unwrap();
    let orders = checkout.orders();

    let order = orders
        .update_payment_status(&id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Processing);

    let err = orders
        .update_status(&id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderStoreError::InvalidTransition {
            from: OrderStatus::Processing,
            to: OrderStatus::Completed
        }
    ));

    orders.update_status(&id, OrderStatus::Shipped).await.unwrap();
    let order = orders
        .update_status(&id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_status, PaymentStatus::Paid);

    assert!(
        orders
            .update_status(&id, OrderStatus::Cancelled)
            .await
            .is_err()
    );

    let stats = orders.stats().await.unwrap();
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.pending_orders, 0);
    assert_eq!(stats.revenue, Decimal::from(1_095_000));
}
