//! Santander prediction service
//!
//! Serves the fitted pipeline over HTTP.
//!
//! # Usage
//! ```sh
//! MODEL_PATH=models/pipeline.json cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - listen address (default: 0.0.0.0:8000)
//! - `MODEL_PATH` - fitted pipeline artifact (default: models/pipeline.json)
//! - `SAMPLE_FILE_PATH` - file served by /download_sample (default: data/sample_file.csv)
//! - `PREDICTION_OUTPUT` - `probability` or `label` (default: probability)
//! - `MAX_UPLOAD_BYTES` - upload size limit (default: 200 MiB)

use anyhow::{Context, Result};
use santander::config::ServerEnvConfig;
use santander::interfaces::api::{ServiceContext, build_router};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Santander server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = ServerEnvConfig::from_env()?;
    info!(
        "Configuration loaded: Model={:?}, Sample={:?}, Output={:?}",
        config.model_path, config.sample_path, config.prediction_mode
    );

    let ctx = Arc::new(ServiceContext::bootstrap(&config)?);
    let app = build_router(ctx.clone());

    let address = config.socket_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Listening on {}. Press Ctrl+C to shutdown.", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received. Draining connections...");
        })
        .await
        .context("Server error")?;

    drop(ctx);
    info!("Server stopped.");
    Ok(())
}
