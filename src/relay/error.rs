//! Relay errors
//!
//! Every failure leaves the relay as a JSON body `{"error": "..."}`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message used when the upstream error body carries no usable message
pub const GENERIC_UPSTREAM_ERROR: &str = "Inference API error";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("No image uploaded")]
    NoImage,
    #[error("Image too large")]
    TooLarge,
    #[error("Form parsing failed")]
    FormParse(#[source] MultipartError),
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    /// Detail is logged, never sent to the caller
    #[error("Internal server error")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::NoImage => StatusCode::BAD_REQUEST,
            RelayError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::FormParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for RelayError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RelayError::TooLarge
        } else {
            RelayError::FormParse(e)
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            RelayError::Internal(detail) => tracing::error!("internal error: {}", detail),
            RelayError::FormParse(e) => tracing::warn!("multipart parsing failed: {}", e),
            RelayError::Upstream { message, .. } => {
                tracing::warn!("upstream returned {}: {}", status, message)
            }
            _ => tracing::debug!("rejected request: {} {}", status, self),
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
