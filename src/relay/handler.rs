//! HTTP handlers for the relay

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::error::RelayError;
use super::RelayState;
use crate::results::EmotionResult;
use crate::selection::IMAGE_FIELD;

/// POST /api/emotion
///
/// Reads the `image` file part of a multipart body in full and forwards its
/// bytes to the inference endpoint. A body that is not multipart at all
/// has no image part either.
pub async fn relay_emotion(
    State(state): State<RelayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EmotionResult>, RelayError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("not a multipart request: {}", rejection);
        RelayError::NoImage
    })?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        // only a file part counts as the image, not a text field
        if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() {
            continue;
        }
        tracing::debug!(
            "image part: file_name={:?} content_type={:?}",
            field.file_name(),
            field.content_type()
        );
        image = Some(field.bytes().await?);
        break;
    }
    let image = image.ok_or(RelayError::NoImage)?;

    tracing::info!("relaying {} byte image", image.len());
    let result = state.inference.classify(image).await?;
    Ok(Json(result))
}

/// Any other method on /api/emotion
pub async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "emotion-relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<RelayState> {
    Router::new().route("/health", get(health_check))
}
