use super::commands::{DockerCommands, run_sequence};
use crate::domain::ops::{ImageTarget, ServiceReport, ServiceStatus, StepPolicy};
use crate::domain::ports::CommandRunner;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct Manifest {
    config: ManifestConfig,
}

#[derive(Debug, Deserialize)]
struct ManifestConfig {
    digest: String,
}

/// Extract `config.digest` from `docker manifest inspect` output.
fn parse_remote_digest(raw: &str) -> Result<String, String> {
    let manifest: Manifest =
        serde_json::from_str(raw).map_err(|e| format!("unreadable manifest: {e}"))?;
    let digest = manifest.config.digest.trim().to_string();
    if digest.is_empty() {
        return Err("manifest has an empty config digest".to_string());
    }
    Ok(digest)
}

/// First non-empty line of `docker images --quiet`, if any.
fn parse_local_digest(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Compares local image digests with the registry and refreshes the
/// compose services whose image is stale.
pub struct ImagePoller {
    runner: Arc<dyn CommandRunner>,
    docker: DockerCommands,
    policy: StepPolicy,
}

impl ImagePoller {
    pub fn new(runner: Arc<dyn CommandRunner>, docker: DockerCommands, policy: StepPolicy) -> Self {
        Self {
            runner,
            docker,
            policy,
        }
    }

    /// One pass over every target. Failures are reported, never raised.
    pub async fn run(&self, targets: &[ImageTarget]) -> Vec<ServiceReport> {
        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            let status = self.check(target).await;
            let report = ServiceReport {
                service: target.service.clone(),
                status,
            };
            log_report(&target.image, &report);
            reports.push(report);
        }
        reports
    }

    async fn check(&self, target: &ImageTarget) -> ServiceStatus {
        let local = match self.runner.run(&self.docker.local_digest(&target.image)).await {
            Ok(output) => parse_local_digest(&output.stdout),
            Err(e) => {
                return ServiceStatus::LookupFailed {
                    reason: format!("local digest lookup failed: {e}"),
                };
            }
        };

        let remote = match self
            .runner
            .run(&self.docker.manifest_inspect(&target.image))
            .await
        {
            Ok(output) => match parse_remote_digest(&output.stdout) {
                Ok(digest) => digest,
                Err(reason) => return ServiceStatus::LookupFailed { reason },
            },
            Err(e) => {
                return ServiceStatus::LookupFailed {
                    reason: format!("remote digest lookup failed: {e}"),
                };
            }
        };

        match local {
            Some(ref digest) if *digest == remote => ServiceStatus::UpToDate,
            _ => {
                info!(
                    image = %target.image,
                    local = local.as_deref().unwrap_or("<absent>"),
                    remote = %remote,
                    "Image digest changed, refreshing service"
                );
                let mut steps = vec![self.docker.pull(&target.image)];
                steps.extend(self.docker.restart(&target.service));
                steps.push(self.docker.prune_images());
                ServiceStatus::Restarted {
                    steps: run_sequence(self.runner.as_ref(), steps, self.policy).await,
                }
            }
        }
    }
}

fn log_report(image: &str, report: &ServiceReport) {
    match &report.status {
        ServiceStatus::UpToDate => {
            info!(service = %report.service, image, "Image up to date");
        }
        ServiceStatus::LookupFailed { reason } => {
            warn!(service = %report.service, image, reason = %reason, "Skipped image check");
        }
        ServiceStatus::Restarted { steps } => {
            let ok = steps.iter().filter(|s| s.is_success()).count();
            if report.is_healthy() {
                info!(service = %report.service, image, steps = steps.len(), "Service refreshed");
            } else {
                warn!(
                    service = %report.service,
                    image,
                    succeeded = ok,
                    steps = steps.len(),
                    "Service refresh incomplete"
                );
            }
        }
    }
}
