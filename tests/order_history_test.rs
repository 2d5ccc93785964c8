mod common;

use common::{gateway_signature, seed_address, seed_product, seed_user, TestApp};
use rust_decimal_macros::dec;
use storefront_api::{
    entities::FulfillmentStatus,
    errors::ServiceError,
    services::{cart::AddToCartInput, checkout::PlaceOrderInput},
};
use uuid::Uuid;

async fn place_order(app: &TestApp, user_id: Uuid, address_id: Uuid, payment_id: &str) -> Uuid {
    let order = app
        .state
        .services
        .checkout
        .place_order(
            user_id,
            PlaceOrderInput {
                address_id,
                gateway_order_id: "order_hist".to_string(),
                gateway_payment_id: payment_id.to_string(),
                gateway_signature: gateway_signature("gateway_secret", "order_hist", payment_id),
            },
        )
        .await
        .expect("place_order failed");
    order.id
}

async fn fill_cart(app: &TestApp, user_id: Uuid, product_id: Uuid, qty: i32) {
    app.state
        .services
        .cart
        .add_item(
            user_id,
            AddToCartInput {
                product_id,
                quantity: qty,
                customization_text: Some("For Maya".to_string()),
                image_path: None,
                contact_number: None,
                use_default: false,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn history_and_invoice_reflect_the_placed_order() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let product = seed_product(&app, "Engraved pen", dec!(150)).await;

    fill_cart(&app, user_id, product, 2).await;
    let order_id = place_order(&app, user_id, address_id, "pay_hist_1").await;

    let history = app
        .state
        .services
        .orders
        .list_for_user(user_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].order.id, order_id);
    assert_eq!(history[0].items.len(), 1);
    assert_eq!(history[0].items[0].product_name, "Engraved pen");

    let invoice = app
        .state
        .services
        .orders
        .invoice(user_id, order_id)
        .await
        .unwrap();
    assert_eq!(invoice.customer_name, "Asha");
    assert_eq!(invoice.total, dec!(300));
    assert_eq!(invoice.lines.len(), 1);
    assert_eq!(invoice.lines[0].subtotal, dec!(300));
    assert_eq!(invoice.lines[0].customization_text.as_deref(), Some("For Maya"));
    assert_eq!(invoice.payment_reference, "pay_hist_1");
}

#[tokio::test]
async fn orders_are_invisible_to_other_users() {
    let app = TestApp::new().await;
    let owner = seed_user(&app, "Asha", "asha@example.com").await;
    let other = seed_user(&app, "Vikram", "vikram@example.com").await;
    let address_id = seed_address(&app, owner).await;
    let product = seed_product(&app, "Engraved pen", dec!(150)).await;

    fill_cart(&app, owner, product, 1).await;
    let order_id = place_order(&app, owner, address_id, "pay_hist_2").await;

    assert!(app
        .state
        .services
        .orders
        .list_for_user(other)
        .await
        .unwrap()
        .is_empty());

    let result = app.state.services.orders.get_for_user(other, order_id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn admin_views_include_customer_and_address() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let address_id = seed_address(&app, user_id).await;
    let product = seed_product(&app, "Engraved pen", dec!(150)).await;

    fill_cart(&app, user_id, product, 1).await;
    let order_id = place_order(&app, user_id, address_id, "pay_hist_3").await;

    let listing = app.state.services.orders.admin_list().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].customer_name, "Asha");
    assert_eq!(
        listing[0].order.fulfillment_status,
        FulfillmentStatus::Pending
    );

    let detail = app.state.services.orders.admin_get(order_id).await.unwrap();
    assert_eq!(detail.customer_name, "Asha");
    assert_eq!(detail.items.len(), 1);
    let address = detail.address.expect("address expected");
    assert_eq!(address.id, address_id);
    assert_eq!(address.city, "Pune");
}
