//! Relay configuration
//!
//! Read once at startup from the process environment (and a `.env` file
//! when present), then injected into the router state.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/akhaliq/Emotion-detection";
pub const DEFAULT_BIND: &str = "127.0.0.1:3001";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Settings for the relay service
#[derive(Clone)]
pub struct RelayConfig {
    /// Address the HTTP server listens on
    pub bind: SocketAddr,
    /// External inference endpoint the image bytes are posted to
    pub inference_url: String,
    /// Bearer credential for the inference endpoint
    pub api_key: String,
    /// Total timeout for one upstream call
    pub upstream_timeout: Duration,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl RelayConfig {
    /// Config with defaults for everything but the credential
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3001)),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            api_key: api_key.into(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_inference_url(mut self, url: impl Into<String>) -> Self {
        self.inference_url = url.into();
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Load configuration from the environment.
    ///
    /// `HF_API_KEY` is required; everything else has a default.
    ///
    /// # Errors
    /// Fails when the credential is missing or a value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match lookup("HF_API_KEY") {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!("HF_API_KEY is not set; the relay cannot authenticate upstream"),
        };

        let mut config = Self::new(api_key);

        let bind = lookup("RELAY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        config.bind = bind
            .parse()
            .with_context(|| format!("Invalid RELAY_BIND address: {}", bind))?;

        if let Some(url) = lookup("INFERENCE_URL") {
            config.inference_url = url;
        }

        if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid UPSTREAM_TIMEOUT_SECS: {}", secs))?;
            config.upstream_timeout = Duration::from_secs(secs);
        }

        if let Some(bytes) = lookup("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = bytes
                .parse()
                .with_context(|| format!("Invalid MAX_UPLOAD_BYTES: {}", bytes))?;
        }

        Ok(config)
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind", &self.bind)
            .field("inference_url", &self.inference_url)
            .field("api_key", &"<redacted>")
            .field("upstream_timeout", &self.upstream_timeout)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}
