use crate::domain::errors::PredictionError;
use crate::domain::ml::feature_registry::SCHEMA_ERROR_MESSAGE;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Handler failure rendered as `{"detail": ...}`
#[derive(Debug)]
pub enum ApiError {
    /// Client input the service cannot use
    Unprocessable(String),
    /// Inference or internal failure
    Internal(String),
    /// Transport-level rejection carrying its own status
    Status(StatusCode, String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Status(status, _) => *status,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Unprocessable(_) => "rejected",
            ApiError::Internal(_) => "error",
            ApiError::Status(..) => "transport",
        }
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        match err {
            // input problems all collapse to the one message clients know
            PredictionError::Rejected(_) => ApiError::Unprocessable(SCHEMA_ERROR_MESSAGE.to_string()),
            PredictionError::Inference(e) => ApiError::Internal(format!("Prediction failed: {e}")),
            PredictionError::Encoding { reason } => {
                ApiError::Internal(format!("Failed to encode predictions: {reason}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Unprocessable(d) | ApiError::Internal(d) | ApiError::Status(_, d) => d,
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
