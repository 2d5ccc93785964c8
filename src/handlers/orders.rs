use crate::handlers::common::{map_service_error, success_response};
use crate::{
    auth::{AdminUser, AuthUser},
    entities::FulfillmentStatus,
    errors::ApiError,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Customer order history routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/invoice", get(get_invoice))
}

/// Back-office order management
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list_orders))
        .route("/:id", get(admin_get_order))
        .route("/:id/status", post(admin_update_status))
}

/// Order history for the logged-in user
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Orders with items"),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_for_user(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_for_user(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Structured invoice document for an order the user owns
async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state
        .services
        .orders
        .invoice(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(invoice))
}

async fn admin_list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .admin_list()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

async fn admin_get_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .admin_get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Advance an order's fulfillment status; out-of-order transitions are
/// rejected server-side
#[utoipa::path(
    post,
    path = "/api/v1/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Transition rejected", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn admin_update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .order_status
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: FulfillmentStatus,
}
