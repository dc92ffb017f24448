use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An external command: program plus arguments, run without a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a command that exited successfully
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// What to do with the rest of a restart sequence once a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPolicy {
    /// Stop at the first failed step.
    #[default]
    Abort,
    /// Attempt every step regardless of earlier failures.
    Continue,
}

impl FromStr for StepPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" | "stop" => Ok(StepPolicy::Abort),
            "continue" => Ok(StepPolicy::Continue),
            _ => anyhow::bail!(
                "Invalid POLLER_STEP_POLICY: {}. Must be 'abort' or 'continue'",
                s
            ),
        }
    }
}

/// Result of one step in a restart sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded(CommandSpec),
    Failed { command: CommandSpec, reason: String },
    Skipped(CommandSpec),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded(_))
    }
}

/// Per-service result of a poller run
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStatus {
    /// Local and remote digests match / endpoint answered 200.
    UpToDate,
    /// Digest lookup failed; the pair was skipped.
    LookupFailed { reason: String },
    /// A restart sequence was attempted.
    Restarted { steps: Vec<StepOutcome> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReport {
    pub service: String,
    pub status: ServiceStatus,
}

impl ServiceReport {
    /// True when no step of an attempted restart failed.
    pub fn is_healthy(&self) -> bool {
        match &self.status {
            ServiceStatus::UpToDate => true,
            ServiceStatus::LookupFailed { .. } => false,
            ServiceStatus::Restarted { steps } => steps.iter().all(StepOutcome::is_success),
        }
    }
}

/// A container image and the compose service that runs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTarget {
    pub image: String,
    pub service: String,
}

/// A compose service and the local port its HTTP root answers on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthTarget {
    pub service: String,
    pub port: u16,
}

/// Outcome of a single health request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Healthy,
    Unhealthy { status: u16 },
    Unreachable { reason: String },
}
