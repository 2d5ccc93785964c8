use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::cart::{AddToCartInput, QuantityAction},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/items", post(add_item))
        .route("/items/:item_id/quantity", post(step_quantity))
        .route("/items/:item_id", delete(remove_item))
        .route("/clear", post(clear_cart))
}

/// Cart contents with catalog prices and the running total
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart contents"),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_cart(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .cart
        .add_item(
            user.user_id,
            AddToCartInput {
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

    Ok(created_response(item))
}

async fn step_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<QuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .cart
        .step_quantity(user.user_id, item_id, payload.action)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(item))
}

async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart
        .clear(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "message": "Cart cleared successfully"
    })))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub customization_text: Option<String>,
    pub image_path: Option<String>,
    pub contact_number: Option<String>,
    #[serde(default)]
    pub use_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub action: QuantityAction,
}
