pub mod types;

pub use types::{
    CommandOutput, CommandSpec, HealthTarget, ImageTarget, ProbeResult, ServiceReport,
    ServiceStatus, StepOutcome, StepPolicy,
};
