use crate::domain::ops::{CommandSpec, StepOutcome, StepPolicy};
use crate::domain::ports::CommandRunner;
use tracing::{info, warn};

/// Builds the container-runtime invocations the pollers issue.
#[derive(Debug, Clone)]
pub struct DockerCommands {
    program: String,
}

impl Default for DockerCommands {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCommands {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command<const N: usize>(&self, args: [&str; N]) -> CommandSpec {
        CommandSpec::new(self.program.clone(), args)
    }

    pub fn local_digest(&self, image: &str) -> CommandSpec {
        self.command(["images", "--no-trunc", "--quiet", image])
    }

    pub fn manifest_inspect(&self, image: &str) -> CommandSpec {
        self.command(["manifest", "inspect", image])
    }

    pub fn pull(&self, image: &str) -> CommandSpec {
        self.command(["pull", image])
    }

    pub fn compose_stop(&self, service: &str) -> CommandSpec {
        self.command(["compose", "stop", service])
    }

    pub fn compose_up(&self, service: &str) -> CommandSpec {
        self.command(["compose", "up", "-d", "--no-deps", service])
    }

    pub fn prune_images(&self) -> CommandSpec {
        self.command(["image", "prune", "-f"])
    }

    /// Stop then recreate a compose service.
    pub fn restart(&self, service: &str) -> Vec<CommandSpec> {
        vec![self.compose_stop(service), self.compose_up(service)]
    }
}

/// Run `steps` in order. Under [`StepPolicy::Abort`] the first failure marks
/// every remaining step as skipped.
pub async fn run_sequence(
    runner: &dyn CommandRunner,
    steps: Vec<CommandSpec>,
    policy: StepPolicy,
) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(steps.len());
    let mut aborted = false;

    for step in steps {
        if aborted {
            outcomes.push(StepOutcome::Skipped(step));
            continue;
        }

        match runner.run(&step).await {
            Ok(_) => {
                info!(command = %step, "Step succeeded");
                outcomes.push(StepOutcome::Succeeded(step));
            }
            Err(e) => {
                warn!(command = %step, error = %e, "Step failed");
                aborted = policy == StepPolicy::Abort;
                outcomes.push(StepOutcome::Failed {
                    command: step,
                    reason: e.to_string(),
                });
            }
        }
    }

    outcomes
}
