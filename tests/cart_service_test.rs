mod common;

use common::{seed_product, seed_user, TestApp};
use rust_decimal_macros::dec;
use storefront_api::{
    errors::ServiceError,
    services::cart::{AddToCartInput, QuantityAction},
};

fn input(product_id: uuid::Uuid, quantity: i32) -> AddToCartInput {
    AddToCartInput {
        product_id,
        quantity,
        customization_text: None,
        image_path: None,
        contact_number: None,
        use_default: true,
    }
}

#[tokio::test]
async fn cart_totals_use_catalog_prices() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let product_a = seed_product(&app, "Product A", dec!(19.99)).await;
    let product_b = seed_product(&app, "Product B", dec!(5)).await;

    let cart = &app.state.services.cart;
    cart.add_item(user_id, input(product_a, 2)).await.unwrap();
    cart.add_item(user_id, input(product_b, 3)).await.unwrap();

    let view = cart.get_cart(user_id).await.unwrap();
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.total, dec!(54.98));

    let line_a = view
        .items
        .iter()
        .find(|l| l.item.product_id == product_a)
        .unwrap();
    assert_eq!(line_a.unit_price, dec!(19.99));
    assert_eq!(line_a.line_total, dec!(39.98));
    assert_eq!(line_a.product_name, "Product A");
}

#[tokio::test]
async fn adding_unknown_product_is_rejected() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;

    let result = app
        .state
        .services
        .cart
        .add_item(user_id, input(uuid::Uuid::new_v4(), 1))
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn default_customization_suppresses_custom_fields() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let product = seed_product(&app, "Product A", dec!(10)).await;

    let item = app
        .state
        .services
        .cart
        .add_item(
            user_id,
            AddToCartInput {
                product_id: product,
                quantity: 1,
                customization_text: Some("ignored".to_string()),
                image_path: Some("/ignored.png".to_string()),
                contact_number: Some("+911234567890".to_string()),
                use_default: true,
            },
        )
        .await
        .unwrap();

    assert!(item.use_default);
    assert!(item.customization_text.is_none());
    assert!(item.image_path.is_none());
    assert!(item.contact_number.is_none());
}

#[tokio::test]
async fn quantity_steps_up_and_floors_at_one() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let product = seed_product(&app, "Product A", dec!(10)).await;

    let cart = &app.state.services.cart;
    let item = cart.add_item(user_id, input(product, 1)).await.unwrap();

    let item = cart
        .step_quantity(user_id, item.id, QuantityAction::Increase)
        .await
        .unwrap();
    assert_eq!(item.quantity, 2);

    let item = cart
        .step_quantity(user_id, item.id, QuantityAction::Decrease)
        .await
        .unwrap();
    assert_eq!(item.quantity, 1);

    // Decreasing at 1 keeps the line; removal is explicit
    let item = cart
        .step_quantity(user_id, item.id, QuantityAction::Decrease)
        .await
        .unwrap();
    assert_eq!(item.quantity, 1);
}

#[tokio::test]
async fn items_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    let owner = seed_user(&app, "Asha", "asha@example.com").await;
    let intruder = seed_user(&app, "Vikram", "vikram@example.com").await;
    let product = seed_product(&app, "Product A", dec!(10)).await;

    let cart = &app.state.services.cart;
    let item = cart.add_item(owner, input(product, 1)).await.unwrap();

    let result = cart
        .step_quantity(intruder, item.id, QuantityAction::Increase)
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let result = cart.remove_item(intruder, item.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn remove_and_clear_empty_the_cart() {
    let app = TestApp::new().await;
    let user_id = seed_user(&app, "Asha", "asha@example.com").await;
    let product = seed_product(&app, "Product A", dec!(10)).await;

    let cart = &app.state.services.cart;
    let item = cart.add_item(user_id, input(product, 1)).await.unwrap();
    cart.add_item(user_id, input(product, 2)).await.unwrap();

    cart.remove_item(user_id, item.id).await.unwrap();
    assert_eq!(cart.get_cart(user_id).await.unwrap().items.len(), 1);

    cart.clear(user_id).await.unwrap();
    let view = cart.get_cart(user_id).await.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.total, dec!(0));
}
