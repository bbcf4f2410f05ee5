//! emotion-relay - forwards captured images to the hosted emotion model
//!
//! Configuration comes from the environment (see `RelayConfig::from_env`);
//! a missing `HF_API_KEY` stops the service before it binds.

use anyhow::Result;
use tracing::{error, info};

use emotion_capture::relay::{build_router, RelayConfig, RelayState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting emotion-relay v{}", env!("CARGO_PKG_VERSION"));

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };
    info!("Inference endpoint: {}", config.inference_url);
    info!(
        "Upstream timeout: {}s, max upload: {} bytes",
        config.upstream_timeout.as_secs(),
        config.max_upload_bytes
    );

    let bind = config.bind;
    let state = RelayState::new(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("emotion-relay listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
