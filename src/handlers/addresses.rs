use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{auth::AuthUser, errors::ApiError, services::addresses::AddressInput, AppState};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Address book routes, all scoped to the logged-in user
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses))
        .route("/", post(add_address))
        .route("/:id", put(update_address))
        .route("/:id", delete(delete_address))
        .route("/:id/default", patch(set_default))
}

async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let addresses = state
        .services
        .addresses
        .list(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(addresses))
}

async fn add_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let address = state
        .services
        .addresses
        .add(user.user_id, payload.into_input())
        .await
        .map_err(map_service_error)?;

    Ok(created_response(address))
}

async fn update_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let address = state
        .services
        .addresses
        .update(user.user_id, id, payload.into_input())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(address))
}

async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .addresses
        .delete(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn set_default(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let address = state
        .services
        .addresses
        .set_default(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(address))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 32))]
    pub address_type: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(length(min = 1))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub postal_code: String,
    #[validate(length(min = 1))]
    pub country: String,
}

impl AddressRequest {
    fn into_input(self) -> AddressInput {
        AddressInput {
            address_type: self.address_type,
            full_name: self.full_name,
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
        }
    }
}
