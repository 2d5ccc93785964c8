mod common;

use common::{gateway_signature, seed_address, seed_product, seed_user, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use storefront_api::{
    entities::{cart_item, order_item, FulfillmentStatus, Order, OrderItem, Product},
    errors::ServiceError,
    services::{
        cart::AddToCartInput,
        checkout::{BuyNowInput, CheckoutSource, PlaceOrderInput},
        payments,
    },
};

const SECRET: &str = "gateway_secret";

fn place_input(address_id: uuid::Uuid, gateway_order: &str, payment: &str) -> PlaceOrderInput {
    PlaceOrderInput {
        address_id,
        gateway_order_id: gateway_order.to_string(),
        gateway_payment_id: payment.to_string(),
        gateway_signature: gateway_signature(SECRET, gateway_order, payment),
    }
}

async fn add_plain_item(app: &TestApp, user_id: uuid::Uuid, product_id: uuid::Uuid, qty: i32) {
    app.state
        .services
        .cart
        .add_item(
            user_id,
            AddToCartInput {
                product_id,
                quantity: qty,
                customization_text: None,
                image_path: None,
                contact_number: None,
                use_default: true,
            },
        )
        .await
        .expect("failed to add cart item");
}

#[tokio::test]
async fn cart_checkout_commits_order_and_empties_cart() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let product_a = seed_product(&app, "Product A", dec!(100)).await;
    let product_b = seed_product(&app, "Product B", dec!(50)).await;

    add_plain_item(&app, user_id, product_a, 2).await;
    add_plain_item(&app, user_id, product_b, 1).await;

    // The preview prices the cart from the catalog
    let preview = app
        .state
        .services
        .checkout
        .preview(user_id)
        .await
        .expect("preview failed");
    assert_eq!(preview.source, CheckoutSource::Cart);
    assert_eq!(preview.quote.total, dec!(250));
    assert_eq!(payments::to_minor_units(preview.quote.total).unwrap(), 25000);

    let order = app
        .state
        .services
        .checkout
        .place_order(user_id, place_input(address_id, "order_abc", "pay_123"))
        .await
        .expect("place_order failed");

    assert_eq!(order.total_amount, dec!(250));
    assert_eq!(order.payment_reference, "pay_123");
    assert_eq!(order.payment_status, "paid");
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Pending);

    // Item subtotals sum to the order total
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    let sum: rust_decimal::Decimal = items.iter().map(|i| i.subtotal).sum();
    assert_eq!(sum, order.total_amount);

    let mut subtotals: Vec<_> = items.iter().map(|i| i.subtotal).collect();
    subtotals.sort();
    assert_eq!(subtotals, vec![dec!(50), dec!(200)]);

    // The cart was consumed
    let remaining = storefront_api::entities::CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .all(app.db())
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn forged_signature_aborts_order_persistence() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let product = seed_product(&app, "Product A", dec!(100)).await;
    add_plain_item(&app, user_id, product, 1).await;

    let result = app
        .state
        .services
        .checkout
        .place_order(
            user_id,
            PlaceOrderInput {
                address_id,
                gateway_order_id: "order_abc".to_string(),
                gateway_payment_id: "pay_123".to_string(),
                gateway_signature: gateway_signature(SECRET, "order_abc", "pay_999"),
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::PaymentFailed(_))));

    // No order row and an intact cart
    assert!(Order::find().all(app.db()).await.unwrap().is_empty());
    let remaining = storefront_api::entities::CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn buy_now_checkout_leaves_cart_untouched() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let cart_product = seed_product(&app, "Cart product", dec!(75)).await;
    let buy_now_product = seed_product(&app, "Buy-now product", dec!(120)).await;

    add_plain_item(&app, user_id, cart_product, 1).await;

    app.state
        .services
        .checkout
        .stash_buy_now(
            user_id,
            BuyNowInput {
                product_id: buy_now_product,
                quantity: 2,
                customization_text: Some("Happy birthday!".to_string()),
                image_path: None,
                contact_number: None,
                use_default: false,
            },
        )
        .await
        .expect("stash failed");

    // The live selection takes precedence over the cart
    let preview = app
        .state
        .services
        .checkout
        .preview(user_id)
        .await
        .unwrap();
    assert_eq!(preview.source, CheckoutSource::BuyNow);
    assert_eq!(preview.quote.total, dec!(240));

    let order = app
        .state
        .services
        .checkout
        .place_order(user_id, place_input(address_id, "order_bn", "pay_bn"))
        .await
        .expect("place_order failed");
    assert_eq!(order.total_amount, dec!(240));

    // The customization travelled onto the order line
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].customization_text.as_deref(),
        Some("Happy birthday!")
    );

    // Selection consumed, cart untouched
    assert!(storefront_api::entities::BuyNowSelection::find()
        .all(app.db())
        .await
        .unwrap()
        .is_empty());
    let remaining = storefront_api::entities::CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn expired_buy_now_selection_falls_back_to_cart() {
    let mut cfg = common::test_config();
    cfg.buy_now_ttl_secs = -1; // already expired when read back
    let app = TestApp::with_config(cfg).await;

    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let cart_product = seed_product(&app, "Cart product", dec!(75)).await;
    let buy_now_product = seed_product(&app, "Buy-now product", dec!(120)).await;

    add_plain_item(&app, user_id, cart_product, 1).await;
    app.state
        .services
        .checkout
        .stash_buy_now(
            user_id,
            BuyNowInput {
                product_id: buy_now_product,
                quantity: 1,
                customization_text: None,
                image_path: None,
                contact_number: None,
                use_default: true,
            },
        )
        .await
        .unwrap();

    let order = app
        .state
        .services
        .checkout
        .place_order(user_id, place_input(address_id, "order_exp", "pay_exp"))
        .await
        .expect("place_order failed");

    // The expired selection was ignored and dropped; the cart was consumed
    assert_eq!(order.total_amount, dec!(75));
    assert!(storefront_api::entities::BuyNowSelection::find()
        .all(app.db())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn double_submit_of_one_payment_yields_one_order() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let product = seed_product(&app, "Product A", dec!(100)).await;
    add_plain_item(&app, user_id, product, 1).await;

    let input = place_input(address_id, "order_abc", "pay_once");
    app.state
        .services
        .checkout
        .place_order(user_id, input.clone())
        .await
        .expect("first submit failed");

    // Re-add something so the second submit has a non-empty source; the
    // payment reference must still be refused
    add_plain_item(&app, user_id, product, 1).await;
    let second = app
        .state
        .services
        .checkout
        .place_order(user_id, input)
        .await;

    assert!(matches!(second, Err(ServiceError::Conflict(_))));
    assert_eq!(Order::find().all(app.db()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn vanished_product_fails_checkout_under_fail_policy() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let product = seed_product(&app, "Product A", dec!(100)).await;
    add_plain_item(&app, user_id, product, 1).await;

    Product::delete_by_id(product).exec(app.db()).await.unwrap();

    let result = app
        .state
        .services
        .checkout
        .place_order(user_id, place_input(address_id, "order_gone", "pay_gone"))
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
    assert!(Order::find().all(app.db()).await.unwrap().is_empty());
}

#[tokio::test]
async fn vanished_product_is_dropped_under_skip_policy() {
    let mut cfg = common::test_config();
    cfg.checkout_missing_product_policy = "skip".to_string();
    let app = TestApp::with_config(cfg).await;

    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let kept = seed_product(&app, "Kept", dec!(100)).await;
    let dropped = seed_product(&app, "Dropped", dec!(40)).await;
    add_plain_item(&app, user_id, kept, 1).await;
    add_plain_item(&app, user_id, dropped, 1).await;

    Product::delete_by_id(dropped).exec(app.db()).await.unwrap();

    let order = app
        .state
        .services
        .checkout
        .place_order(user_id, place_input(address_id, "order_skip", "pay_skip"))
        .await
        .expect("place_order failed");

    assert_eq!(order.total_amount, dec!(100));
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn empty_checkout_is_rejected() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;

    let result = app
        .state
        .services
        .checkout
        .place_order(user_id, place_input(address_id, "order_none", "pay_none"))
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
}

#[tokio::test]
async fn address_must_belong_to_the_buyer() {
    let app = TestApp::new().await;
    let buyer = seed_user(&app, "Asha", "asha@example.com").await;
    let other = seed_user(&app, "Vikram", "vikram@example.com").await;
    let foreign_address = seed_address(&app, other).await;
    let product = seed_product(&app, "Product A", dec!(100)).await;
    add_plain_item(&app, buyer, product, 1).await;

    let result = app
        .state
        .services
        .checkout
        .place_order(buyer, place_input(foreign_address, "order_x", "pay_x"))
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
