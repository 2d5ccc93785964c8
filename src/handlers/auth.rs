use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::users::RegisterInput,
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Account and session routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
        .route("/me", get(me))
}

/// Create an account and sign in
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let session = state
        .services
        .users
        .register(RegisterInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(SessionResponse::from(session)))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in"),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let session = state
        .services
        .users
        .login(&payload.email, &payload.password)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(SessionResponse::from(session)))
}

/// Back-office sign in against configured credentials
async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let session = state
        .services
        .users
        .admin_login(&payload.email, &payload.password)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(SessionResponse::from(session)))
}

/// Profile of the logged-in user
async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .services
        .users
        .get_profile(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(profile))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<crate::entities::UserModel>,
}

impl From<crate::services::users::AuthenticatedSession> for SessionResponse {
    fn from(session: crate::services::users::AuthenticatedSession) -> Self {
        Self {
            token: session.token,
            user: session.user,
        }
    }
}
