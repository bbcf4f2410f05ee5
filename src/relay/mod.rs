//! Relay service
//!
//! Stateless pass-through between the capture client and the hosted
//! emotion model: the client never sees the provider's endpoint or
//! credential, and each request is handled independently.

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handler;
pub mod upstream;

pub use config::RelayConfig;
pub use error::RelayError;
pub use upstream::InferenceClient;

use crate::api::EMOTION_PATH;

/// State shared across relay handlers
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub inference: InferenceClient,
}

impl RelayState {
    /// Create relay state from configuration
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let inference = InferenceClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            inference,
        })
    }
}

/// Build the relay router
pub fn build_router(state: RelayState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route(
            EMOTION_PATH,
            post(handler::relay_emotion).fallback(handler::method_not_allowed),
        )
        .merge(handler::health_routes())
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
