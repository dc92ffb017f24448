use crate::domain::errors::CommandError;
use crate::domain::ops::{CommandOutput, CommandSpec, ProbeResult};
use async_trait::async_trait;

// Need async_trait for async functions in trait objects
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion. A non-zero exit is an error.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// How the prediction service answered an upload
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
    /// 200 with the predictions CSV body
    Predictions(Vec<u8>),
    /// 422 with the service's `detail` message
    Rejected(String),
    /// Any other status or a transport failure
    Unreachable(String),
}

/// Client side of the prediction HTTP API
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn fetch_sample(&self) -> Result<Vec<u8>, String>;
    async fn predict(&self, file_name: &str, bytes: Vec<u8>) -> PredictOutcome;
}
