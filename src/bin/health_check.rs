//! Single-shot health poller
//!
//! Probes each service's HTTP root on `HOST_IP` and recreates the compose
//! service when it does not answer 200. Always exits 0.

use santander::application::ops::{DockerCommands, HealthPoller};
use santander::config::PollerEnvConfig;
use santander::infrastructure::{HttpHealthProbe, ProcessCommandRunner};
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

    let poller = HealthPoller::new(
        Arc::new(HttpHealthProbe::new(config.health_timeout)),
        Arc::new(ProcessCommandRunner::new(config.command_timeout)),
        DockerCommands::new(config.docker_bin.clone()),
        config.step_policy,
        config.host_ip.clone(),
    );

    let reports = poller.run(&config.health_targets).await;
    let healthy = reports.iter().filter(|r| r.is_healthy()).count();
    info!(
        "Health check finished: {}/{} services healthy",
        healthy,
        reports.len()
    );
}
