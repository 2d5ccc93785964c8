use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::{auth::AuthUser, errors::ApiError, services::reviews::ReviewInput, AppState};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Review routes, nested under the product they belong to
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products/:id/reviews", get(list_reviews))
        .route("/products/:id/reviews", post(add_review))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = state
        .services
        .reviews
        .list_for_product(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(reviews))
}

async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let review = state
        .services
        .reviews
        .add_review(
            user.user_id,
            product_id,
            ReviewInput {
                rating: payload.rating,
                comment: payload.comment,
                image_path: payload.image_path,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(review))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub comment: Option<String>,
    pub image_path: Option<String>,
}
