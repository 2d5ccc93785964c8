use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::checkout::{BuyNowInput, PlaceOrderInput},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for checkout endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/buy-now", post(stash_buy_now))
        .route("/buy-now", delete(clear_buy_now))
        .route("/preview", get(preview))
        .route("/session", post(create_payment_session))
        .route("/place-order", post(place_order))
}

/// Stash a single-item buy-now selection
#[utoipa::path(
    post,
    path = "/api/v1/checkout/buy-now",
    request_body = BuyNowRequest,
    responses(
        (status = 201, description = "Selection stashed"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn stash_buy_now(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BuyNowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let selection = state
        .services
        .checkout
        .stash_buy_now(
            user.user_id,
            BuyNowInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
                customization_text: payload.customization_text,
                image_path: payload.image_path,
                contact_number: payload.contact_number,
                use_default: payload.use_default,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(selection))
}

async fn clear_buy_now(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .checkout
        .clear_buy_now(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Checkout page data: priced lines from the pending source
async fn preview(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let preview = state
        .services
        .checkout
        .preview(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(preview))
}

/// Register a payment intent with the gateway for the pending checkout
#[utoipa::path(
    post,
    path = "/api/v1/checkout/session",
    responses(
        (status = 201, description = "Payment session created"),
        (status = 422, description = "Nothing to check out", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn create_payment_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .services
        .checkout
        .create_payment_session(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(session))
}

/// Verify the gateway callback and commit the order
#[utoipa::path(
    post,
    path = "/api/v1/checkout/place-order",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order committed"),
        (status = 402, description = "Signature verification failed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Payment already consumed", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .checkout
        .place_order(
            user.user_id,
            PlaceOrderInput {
                address_id: payload.address_id,
                gateway_order_id: payload.gateway_order_id,
                gateway_payment_id: payload.gateway_payment_id,
                gateway_signature: payload.gateway_signature,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(order))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BuyNowRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub customization_text: Option<String>,
    pub image_path: Option<String>,
    pub contact_number: Option<String>,
    #[serde(default)]
    pub use_default: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    pub address_id: Uuid,
    #[validate(length(min = 1))]
    pub gateway_order_id: String,
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1))]
    pub gateway_signature: String,
}
