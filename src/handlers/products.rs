use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    auth::AdminUser,
    errors::ApiError,
    services::catalog::ProductInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Storefront product routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

/// Category listing
pub fn category_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

/// Back-office product management
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
}

/// List all products, newest first
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "Product listing")
    ),
    tag = "Catalog"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .catalog
        .list_products()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Product detail with up to three related products
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .catalog
        .get_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductDetailResponse {
        product: detail.product,
        related: detail.related,
    }))
}

async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .catalog
        .list_categories()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}

async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .catalog
        .create_product(payload.into_input())
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .catalog
        .update_product(id, payload.into_input())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Request/Response DTOs

#[derive(Debug, Serialize)]
struct ProductDetailResponse {
    product: crate::entities::ProductModel,
    related: Vec<crate::entities::ProductModel>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub price: Decimal,
    /// Existing category name
    pub category: Option<String>,
    /// Brand-new category to create and assign
    pub new_category: Option<String>,
    pub image_path: Option<String>,
}

impl ProductRequest {
    fn into_input(self) -> ProductInput {
        ProductInput {
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            new_category: self.new_category,
            image_path: self.image_path,
        }
    }
}
