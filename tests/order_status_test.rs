mod common;

use chrono::Utc;
use common::{seed_address, seed_user, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    entities::{order, FulfillmentStatus},
    errors::ServiceError,
};
use uuid::Uuid;

async fn seed_order(app: &TestApp, status: FulfillmentStatus) -> Uuid {
    let user_id = seed_user(
        app,
        "Asha",
        &format!("asha+{}@example.com", Uuid::new_v4()),
    )
    .await;
    let address_id = seed_address(app, user_id).await;

    let id = Uuid::new_v4();
    order::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        address_id: Set(address_id),
        total_amount: Set(dec!(100)),
        payment_reference: Set(format!("pay_{}", id)),
        payment_status: Set("paid".to_string()),
        fulfillment_status: Set(status),
        created_at: Set(Utc::now()),
    }
    .insert(app.db())
    .await
    .expect("failed to seed order");
    id
}

#[tokio::test]
async fn forward_transition_is_applied() {
    let app = TestApp::new().await;
    let order_id = seed_order(&app, FulfillmentStatus::Pending).await;

    let updated = app
        .state
        .services
        .order_status
        .update_status(order_id, FulfillmentStatus::Accepted)
        .await
        .expect("transition failed");

    assert_eq!(updated.fulfillment_status, FulfillmentStatus::Accepted);
}

#[tokio::test]
async fn shipped_cannot_revert_to_pending() {
    let app = TestApp::new().await;
    let order_id = seed_order(&app, FulfillmentStatus::Shipped).await;

    let result = app
        .state
        .services
        .order_status
        .update_status(order_id, FulfillmentStatus::Pending)
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // The stored status is untouched
    let status = app
        .state
        .services
        .order_status
        .get_status(order_id)
        .await
        .unwrap();
    assert_eq!(status, FulfillmentStatus::Shipped);
}

#[tokio::test]
async fn cancel_is_reachable_until_delivery() {
    let app = TestApp::new().await;

    let order_id = seed_order(&app, FulfillmentStatus::OutForDelivery).await;
    let updated = app
        .state
        .services
        .order_status
        .update_status(order_id, FulfillmentStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(updated.fulfillment_status, FulfillmentStatus::Cancelled);

    let delivered = seed_order(&app, FulfillmentStatus::Delivered).await;
    let result = app
        .state
        .services
        .order_status
        .update_status(delivered, FulfillmentStatus::Cancelled)
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn same_status_is_a_no_op() {
    let app = TestApp::new().await;
    let order_id = seed_order(&app, FulfillmentStatus::Accepted).await;

    let updated = app
        .state
        .services
        .order_status
        .update_status(order_id, FulfillmentStatus::Accepted)
        .await
        .unwrap();

    assert_eq!(updated.fulfillment_status, FulfillmentStatus::Accepted);
}

#[tokio::test]
async fn unknown_order_is_reported() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .order_status
        .update_status(Uuid::new_v4(), FulfillmentStatus::Accepted)
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
