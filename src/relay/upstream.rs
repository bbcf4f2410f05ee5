//! External inference client
//!
//! Posts raw image bytes to the hosted emotion model and hands back its
//! JSON answer. No retries: each call is attempted once, bounded by the
//! configured timeout.

use axum::body::Bytes;
use axum::http::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::config::RelayConfig;
use super::error::{RelayError, GENERIC_UPSTREAM_ERROR};
use crate::results::EmotionResult;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the external inference endpoint
#[derive(Clone)]
pub struct InferenceClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl InferenceClient {
    /// Create a client from relay configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &RelayConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.upstream_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.upstream_timeout))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.inference_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Classify one image.
    ///
    /// # Errors
    /// - `Upstream` with the mirrored status when the endpoint rejects the call
    /// - `Internal` when the endpoint cannot be reached or answers with
    ///   something other than JSON
    pub async fn classify(&self, image: Bytes) -> Result<EmotionResult, RelayError> {
        tracing::debug!("POST {} ({} bytes)", self.endpoint, image.len());

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| RelayError::Internal(format!("inference request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            // reqwest and axum sit on different `http` versions
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            let body = response.bytes().await.unwrap_or_default();
            return Err(RelayError::Upstream {
                status,
                message: upstream_message(&body),
            });
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| RelayError::Internal(format!("invalid inference response: {}", e)))?;
        Ok(EmotionResult(result))
    }
}

/// Extract the provider's error message from an error body.
fn upstream_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            Some(Value::Null) | None => GENERIC_UPSTREAM_ERROR.to_string(),
            Some(Value::String(_)) => GENERIC_UPSTREAM_ERROR.to_string(),
            Some(other) => other.to_string(),
        },
        _ => GENERIC_UPSTREAM_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_string() {
        assert_eq!(
            upstream_message(br#"{"error":"Model is loading","estimated_time":20.0}"#),
            "Model is loading"
        );
    }

    #[test]
    fn test_upstream_message_non_string() {
        assert_eq!(
            upstream_message(br#"{"error":["bad input"]}"#),
            r#"["bad input"]"#
        );
    }

    #[test]
    fn test_upstream_message_generic() {
        assert_eq!(upstream_message(b"<html>502</html>"), GENERIC_UPSTREAM_ERROR);
        assert_eq!(upstream_message(br#"{"detail":"x"}"#), GENERIC_UPSTREAM_ERROR);
        assert_eq!(upstream_message(br#"{"error":""}"#), GENERIC_UPSTREAM_ERROR);
        assert_eq!(upstream_message(b""), GENERIC_UPSTREAM_ERROR);
    }
}
