//! Storefront API Library
//!
//! Backend for an e-commerce storefront: catalog, carts, checkout with
//! payment-gateway verification, orders, reviews and an admin back-office.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<auth::AuthService>,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<axum::Json<ApiResponse<T>>, errors::ServiceError>;

/// Full v1 API surface
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", handlers::products::routes())
        .nest("/categories", handlers::products::category_routes())
        .nest("/cart", handlers::carts::routes())
        .nest("/checkout", handlers::checkout::routes())
        .nest("/orders", handlers::orders::routes())
        .nest("/addresses", handlers::addresses::routes())
        .nest("/auth", handlers::auth::routes())
        .nest("/uploads", handlers::uploads::routes())
        .merge(handlers::reviews::routes())
        .nest("/admin/products", handlers::products::admin_routes())
        .nest("/admin/orders", handlers::orders::admin_routes())
}

/// Builds the complete application router over the given state.
pub fn app_router(state: AppState) -> Router {
    let auth_service = state.auth.clone();

    Router::new()
        .route("/", get(|| async { "storefront-api up" }))
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        // Inject AuthService into request extensions for the auth extractors
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<auth::AuthService>>,
             mut req: axum::http::Request<axum::body::Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, errors::ServiceError> {
    db::check_connection(&state.db).await?;
    Ok(axum::Json(serde_json::json!({ "status": "ok" })))
}
