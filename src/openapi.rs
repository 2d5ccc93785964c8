use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{entities, errors, handlers};

/// OpenAPI document for the storefront API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::carts::get_cart,
        handlers::checkout::stash_buy_now,
        handlers::checkout::create_payment_session,
        handlers::checkout::place_order,
        handlers::orders::list_orders,
        handlers::orders::admin_update_status,
        handlers::auth::register,
        handlers::auth::login,
    ),
    components(schemas(
        errors::ErrorResponse,
        entities::FulfillmentStatus,
        handlers::products::ProductRequest,
        handlers::carts::AddItemRequest,
        handlers::checkout::BuyNowRequest,
        handlers::checkout::PlaceOrderRequest,
        handlers::orders::UpdateStatusRequest,
        handlers::addresses::AddressRequest,
        handlers::reviews::ReviewRequest,
        handlers::auth::RegisterRequest,
        handlers::auth::LoginRequest,
    )),
    tags(
        (name = "Catalog", description = "Products and categories"),
        (name = "Cart", description = "Persistent shopping cart"),
        (name = "Checkout", description = "Payment sessions and order placement"),
        (name = "Orders", description = "Customer order history"),
        (name = "Auth", description = "Accounts and sessions"),
        (name = "Admin", description = "Back-office management")
    ),
    info(
        title = "storefront-api",
        description = "E-commerce storefront backend: catalog, cart, checkout with payment verification, orders, reviews and address book"
    )
)]
pub struct ApiDoc;

/// Swagger UI router, mounted next to the API
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
