mod common;

use common::{seed_product, seed_user, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::{
    errors::ServiceError,
    services::{cart::AddToCartInput, payments::PaymentGateway},
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn create_gateway_order_sends_minor_units() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(body_partial_json(json!({
            "amount": 25000,
            "currency": "INR"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_mock_1",
            "amount": 25000,
            "currency": "INR"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = common::test_config();
    cfg.payment_api_base = server.uri();
    let gateway = PaymentGateway::new(&cfg);

    let order = gateway
        .create_gateway_order(dec!(250), "rcpt_test")
        .await
        .expect("gateway call failed");

    assert_eq!(order.id, "order_mock_1");
    assert_eq!(order.amount, 25000);
    assert_eq!(order.currency, "INR");
}

#[tokio::test]
async fn gateway_error_maps_to_external_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut cfg = common::test_config();
    cfg.payment_api_base = server.uri();
    let gateway = PaymentGateway::new(&cfg);

    let result = gateway.create_gateway_order(dec!(10), "rcpt_err").await;
    assert!(matches!(result, Err(ServiceError::ExternalServiceError(_))));
}

#[tokio::test]
async fn payment_session_covers_the_pending_cart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(body_partial_json(json!({ "amount": 12000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_mock_2",
            "amount": 12000,
            "currency": "INR"
        })))
        .mount(&server)
        .await;

    let mut cfg = common::test_config();
    cfg.payment_api_base = server.uri();
    let app = TestApp::with_config(cfg).await;

    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let product = seed_product(&app, "Product A", dec!(60)).await;
    app.state
        .services
        .cart
        .add_item(
            user_id,
            AddToCartInput {
                product_id: product,
                quantity: 2,
                customization_text: None,
                image_path: None,
                contact_number: None,
                use_default: true,
            },
        )
        .await
        .unwrap();

    let session = app
        .state
        .services
        .checkout
        .create_payment_session(user_id)
        .await
        .expect("session creation failed");

    assert_eq!(session.gateway_order_id, "order_mock_2");
    assert_eq!(session.amount_minor, 12000);
    assert_eq!(session.key_id, "key_test");
}

#[tokio::test]
async fn empty_cart_cannot_open_a_payment_session() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;

    let result = app
        .state
        .services
        .checkout
        .create_payment_session(user_id)
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
}
