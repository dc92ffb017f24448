use thiserror::Error;

/// Errors raised while checking an uploaded header against the expected layout
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Column appears more than once: {name}")]
    DuplicateColumn { name: String },
}

/// Errors related to decoding an uploaded CSV file
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload is not valid UTF-8")]
    Encoding,

    #[error("Malformed CSV: {reason}")]
    Malformed { reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid value '{value}' in column {column} (row {row})")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid label '{value}' in row {row}: expected 0 or 1")]
    InvalidLabel { row: usize, value: String },
}

impl From<csv::Error> for UploadError {
    fn from(err: csv::Error) -> Self {
        UploadError::Malformed {
            reason: err.to_string(),
        }
    }
}

/// Errors related to fitting or applying the preprocessing + classifier pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    FeatureWidthMismatch { expected: usize, actual: usize },

    #[error("Label count {labels} does not match row count {rows}")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("Model backend failure: {reason}")]
    Backend { reason: String },
}

/// Errors surfaced by the prediction service
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Rejected(#[from] UploadError),

    #[error("Inference failed: {0}")]
    Inference(#[from] PipelineError),

    #[error("Failed to encode predictions: {reason}")]
    Encoding { reason: String },
}

/// Errors related to running an external command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("'{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("'{command}' exited with status {code:?}")]
    ExitStatus { command: String, code: Option<i32> },
}
