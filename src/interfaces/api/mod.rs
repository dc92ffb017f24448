//! HTTP surface of the prediction service.

pub mod context;
pub mod error;

pub use context::ServiceContext;
pub use error::ApiError;

use axum::Json;
use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

pub const PREDICTIONS_FILE_NAME: &str = "predictions.csv";
pub const SAMPLE_FILE_NAME: &str = "sample_file.csv";
const UPLOAD_FIELD: &str = "file";

pub fn build_router(ctx: Arc<ServiceContext>) -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/ping", get(ping))
        .route("/download_sample", get(download_sample))
        .route("/upload_file_predict", post(upload_file_predict))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(ctx.max_upload_bytes))
        .with_state(ctx)
}

/// `text/csv` attachment response
fn csv_attachment(file_name: &str, body: Vec<u8>) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment;filename={file_name}"))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static("Content-Disposition"),
            ),
        ],
        body,
    )
        .into_response()
}

/// Liveness answer, also served at `/` for the health poller.
async fn ping(State(ctx): State<Arc<ServiceContext>>) -> Json<&'static str> {
    ctx.metrics.inc_requests("ping", "ok");
    Json("pong!")
}

async fn download_sample(State(ctx): State<Arc<ServiceContext>>) -> Response {
    ctx.metrics.inc_requests("download_sample", "ok");
    csv_attachment(SAMPLE_FILE_NAME, ctx.sample.clone())
}

async fn metrics(State(ctx): State<Arc<ServiceContext>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        ctx.metrics.render(),
    )
}

/// Pull the bytes of the `file` field out of the form.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(String, Vec<u8>), ApiError> {
    let mut multipart =
        multipart.map_err(|_| ApiError::Unprocessable("No file uploaded".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Status(e.status(), e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Status(e.status(), e.body_text()))?;
        return Ok((file_name, bytes.to_vec()));
    }

    Err(ApiError::Unprocessable("No file uploaded".to_string()))
}

async fn upload_file_predict(
    State(ctx): State<Arc<ServiceContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("upload_file_predict", %request_id);

    let handler_ctx = ctx.clone();
    let result = async move {
        let ctx = handler_ctx;
        let (file_name, bytes) = read_upload(multipart).await?;
        info!(file = %file_name, bytes = bytes.len(), "Upload received");

        let start = Instant::now();
        let worker_ctx = ctx.clone();
        let output = tokio::task::spawn_blocking(move || worker_ctx.predictor.predict_csv(&bytes))
            .await
            .map_err(|e| ApiError::Internal(format!("Inference task failed: {e}")))?
            .map_err(|e| {
                warn!(error = %e, "Prediction request failed");
                ApiError::from(e)
            })?;

        let elapsed = start.elapsed().as_secs_f64();
        ctx.metrics
            .observe_prediction(output.rows, output.imputed_cells, elapsed);
        info!(
            rows = output.rows,
            imputed_cells = output.imputed_cells,
            elapsed_ms = (elapsed * 1000.0) as u64,
            "Predictions returned"
        );
        Ok::<_, ApiError>(csv_attachment(PREDICTIONS_FILE_NAME, output.csv))
    }
    .instrument(span)
    .await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    ctx.metrics.inc_requests("upload_file_predict", outcome);
    result
}
