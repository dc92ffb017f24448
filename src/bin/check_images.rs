//! Single-shot image digest poller
//!
//! Compares each local image with its registry manifest and refreshes the
//! compose service when they differ. Meant to be run from cron; it always
//! exits 0 once the report is logged.

use santander::application::ops::{DockerCommands, ImagePoller};
use santander::config::PollerEnvConfig;
use santander::infrastructure::ProcessCommandRunner;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = match PollerEnvConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load poller config: {:#}", e);
            return;
        }
    };

    let runner = Arc::new(ProcessCommandRunner::new(config.command_timeout));
    let poller = ImagePoller::new(
        runner,
        DockerCommands::new(config.docker_bin.clone()),
        config.step_policy,
    );

    let reports = poller.run(&config.images).await;
    let healthy = reports.iter().filter(|r| r.is_healthy()).count();
    info!(
        "Image check finished: {}/{} services up to date or refreshed",
        healthy,
        reports.len()
    );
}
