//! Operational poller configuration.
//!
//! Targets come from, in increasing precedence: built-in defaults, the TOML
//! file named by `POLLER_CONFIG`, then `POLLER_IMAGES` / `HEALTH_TARGETS`.

use super::{Lookup, parse_or, parse_pairs, process_env};
use crate::domain::ops::{HealthTarget, ImageTarget, StepPolicy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Optional TOML file layout
///
/// ```toml
/// [[images]]
/// image = "uditmanav/santander_backend:latest"
/// service = "backend"
///
/// [[health]]
/// service = "backend"
/// port = 8000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollerFile {
    pub images: Option<Vec<ImageTarget>>,
    pub health: Option<Vec<HealthTarget>>,
}

impl PollerFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read poller config {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse poller config {:?}", path))
    }
}

#[derive(Debug, Clone)]
pub struct PollerEnvConfig {
    pub host_ip: String,
    pub images: Vec<ImageTarget>,
    pub health_targets: Vec<HealthTarget>,
    pub health_timeout: Duration,
    pub step_policy: StepPolicy,
    pub command_timeout: Duration,
    pub docker_bin: String,
}

// The desktop client is not a container, so only the prediction service is polled by default.
fn default_images() -> Vec<ImageTarget> {
    vec![ImageTarget {
        image: "uditmanav/santander_backend:latest".to_string(),
        service: "backend".to_string(),
    }]
}

fn default_health_targets() -> Vec<HealthTarget> {
    vec![HealthTarget {
        service: "backend".to_string(),
        port: 8000,
    }]
}

impl PollerEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let file = match lookup("POLLER_CONFIG") {
            Some(path) => PollerFile::load(Path::new(&path))?,
            None => PollerFile::default(),
        };

        let images = match lookup("POLLER_IMAGES") {
            Some(raw) => parse_pairs("POLLER_IMAGES", &raw)?
                .into_iter()
                .map(|(image, service)| ImageTarget { image, service })
                .collect(),
            None => file.images.unwrap_or_else(default_images),
        };

        let health_targets = match lookup("HEALTH_TARGETS") {
            Some(raw) => parse_pairs("HEALTH_TARGETS", &raw)?
                .into_iter()
                .map(|(service, port)| {
                    let port = port
                        .parse::<u16>()
                        .with_context(|| format!("Invalid port for {}: {}", service, port))?;
                    Ok(HealthTarget { service, port })
                })
                .collect::<Result<Vec<_>>>()?,
            None => file.health.unwrap_or_else(default_health_targets),
        };

        Ok(Self {
            host_ip: lookup("HOST_IP").unwrap_or_else(|| "localhost".to_string()),
            images,
            health_targets,
            health_timeout: Duration::from_secs(parse_or(lookup, "HEALTH_TIMEOUT_SECS", 10u64)?),
            step_policy: parse_or(lookup, "POLLER_STEP_POLICY", StepPolicy::Abort)?,
            command_timeout: Duration::from_secs(parse_or(
                lookup,
                "POLLER_COMMAND_TIMEOUT_SECS",
                300u64,
            )?),
            docker_bin: lookup("DOCKER_BIN").unwrap_or_else(|| "docker".to_string()),
        })
    }
}
