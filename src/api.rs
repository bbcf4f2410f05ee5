// API client module: a small blocking HTTP client that talks to the relay
// service. The terminal UI is synchronous, so a blocking client keeps the
// flow easy to follow; the UI keeps a spinner ticking while a call runs.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use serde_json::Value;
use thiserror::Error;

use crate::results::EmotionResult;
use crate::selection::{DataUrlError, SubmissionPayload};

/// Path of the relay endpoint, relative to the relay base URL.
pub const EMOTION_PATH: &str = "/api/emotion";

const DEFAULT_RELAY_URL: &str = "http://localhost:3001";

/// Why a submission did not produce a result. The `Display` text is the
/// message shown to the user.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Please upload or capture an image.")]
    NoImageSelected,
    #[error("A submission is already in progress.")]
    AlreadySubmitting,
    #[error("{message}")]
    Relay { status: u16, message: String },
    #[error("Unexpected response from the server")]
    UnexpectedResponse,
    #[error("Error uploading the image")]
    Network(#[source] reqwest::Error),
    #[error("Could not prepare the image: {0}")]
    Payload(#[from] DataUrlError),
}

/// Relay client holding a reqwest blocking client and the relay base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create an ApiClient configured from the environment variable
    /// `RELAY_URL` or fallback to `http://localhost:3001`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.into());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // the relay bounds the upstream call; the client waits for its answer
        let client = Client::builder()
            .timeout(None)
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(ApiClient { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the image to the relay as a single multipart part and parse the
    /// emotion result. Error bodies are expected as `{"error": "..."}`.
    pub fn detect_emotion(
        &self,
        payload: &SubmissionPayload,
    ) -> std::result::Result<EmotionResult, SubmitError> {
        let url = format!("{}{}", &self.base_url, EMOTION_PATH);

        let part = multipart::Part::bytes(payload.bytes.clone())
            .file_name(payload.file_name.clone())
            .mime_str(&payload.mime)
            .map_err(SubmitError::Network)?;
        let form = multipart::Form::new().part(payload.field, part);

        tracing::debug!(
            "POST {} ({} bytes, {}, {})",
            url,
            payload.bytes.len(),
            payload.mime,
            payload.file_name
        );

        let res = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(SubmitError::Network)?;
        let status = res.status();
        let raw = res.text().map_err(SubmitError::Network)?;
        tracing::debug!("relay responded {}: {}", status, raw);

        if !status.is_success() {
            let body: Value =
                serde_json::from_str(&raw).map_err(|_| SubmitError::UnexpectedResponse)?;
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Error detecting emotion")
                .to_string();
            return Err(SubmitError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&raw).map_err(|_| SubmitError::UnexpectedResponse)
    }
}
