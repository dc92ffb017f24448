use super::commands::{DockerCommands, run_sequence};
use crate::domain::ops::{HealthTarget, ProbeResult, ServiceReport, ServiceStatus, StepPolicy};
use crate::domain::ports::{CommandRunner, HealthProbe};
use std::sync::Arc;
use tracing::{info, warn};

/// Probes each service's HTTP root and recreates the ones that do not
/// answer 200.
pub struct HealthPoller {
    probe: Arc<dyn HealthProbe>,
    runner: Arc<dyn CommandRunner>,
    docker: DockerCommands,
    policy: StepPolicy,
    host: String,
}

impl HealthPoller {
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        runner: Arc<dyn CommandRunner>,
        docker: DockerCommands,
        policy: StepPolicy,
        host: impl Into<String>,
    ) -> Self {
        Self {
            probe,
            runner,
            docker,
            policy,
            host: host.into(),
        }
    }

    pub fn url_for(&self, target: &HealthTarget) -> String {
        format!("http://{}:{}/", self.host, target.port)
    }

    pub async fn run(&self, targets: &[HealthTarget]) -> Vec<ServiceReport> {
        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            let url = self.url_for(target);
            let status = match self.probe.probe(&url).await {
                ProbeResult::Healthy => {
                    info!(service = %target.service, url = %url, "Service healthy");
                    ServiceStatus::UpToDate
                }
                unhealthy => {
                    warn!(service = %target.service, url = %url, result = ?unhealthy, "Service unhealthy, restarting");
                    let steps = run_sequence(
                        self.runner.as_ref(),
                        self.docker.restart(&target.service),
                        self.policy,
                    )
                    .await;
                    ServiceStatus::Restarted { steps }
                }
            };

            let report = ServiceReport {
                service: target.service.clone(),
                status,
            };
            if !report.is_healthy() {
                warn!(service = %report.service, "Restart did not complete");
            }
            reports.push(report);
        }
        reports
    }
}
