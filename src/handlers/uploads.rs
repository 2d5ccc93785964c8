use crate::handlers::common::map_service_error;
use crate::{auth::AuthUser, errors::ApiError, errors::ServiceError, AppState};
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::info;
use uuid::Uuid;

/// Upload routes: storing requires a login, fetching is public
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images", post(upload_image))
        .route("/images/:file_name", get(serve_image))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    /// Path to store on the owning row (cart line, product, review)
    path: String,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Accepts a single image field and stores it under the upload directory.
async fn upload_image(
    State(state): State<AppState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest {
            message: format!("invalid multipart payload: {}", e),
        })?
        .ok_or_else(|| ApiError::BadRequest {
            message: "expected an image field".to_string(),
        })?;

    let content_type = field
        .content_type()
        .map(str::to_owned)
        .ok_or_else(|| ApiError::BadRequest {
            message: "content type is not set".to_string(),
        })?;

    let extension = extension_for(&content_type).ok_or_else(|| ApiError::BadRequest {
        message: format!("unsupported content type: {}", content_type),
    })?;

    let data = field.bytes().await.map_err(|e| ApiError::BadRequest {
        message: format!("failed to read file bytes: {}", e),
    })?;

    if data.len() > state.config.upload_max_bytes {
        return Err(ApiError::BadRequest {
            message: format!(
                "file exceeds the {} byte limit",
                state.config.upload_max_bytes
            ),
        });
    }

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let dir = state.config.upload_dir.clone();

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| map_service_error(ServiceError::InternalError(e.to_string())))?;

    let mut file = tokio::fs::File::create(format!("{}/{}", dir, file_name))
        .await
        .map_err(|e| map_service_error(ServiceError::InternalError(e.to_string())))?;
    file.write_all(&data)
        .await
        .map_err(|e| map_service_error(ServiceError::InternalError(e.to_string())))?;

    info!("Stored upload {} ({} bytes)", file_name, data.len());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            path: format!("/api/v1/uploads/images/{}", file_name),
        }),
    ))
}

/// Streams a stored image back with its content type.
async fn serve_image(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Uploaded names are uuid.ext; anything else is not ours to serve
    if !file_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        || file_name.contains("..")
    {
        return Err(ApiError::BadRequest {
            message: "invalid file name".to_string(),
        });
    }

    let path = format!("{}/{}", state.config.upload_dir, file_name);
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError::NotFound(format!("image {} not found", file_name)))?;

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    let stream = ReaderStream::new(file);
    Ok((headers, Body::from_stream(stream)))
}
