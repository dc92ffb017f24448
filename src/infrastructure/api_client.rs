use crate::domain::ports::{PredictOutcome, PredictionApi};
use crate::infrastructure::http_client_factory::HttpClientFactory;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP client for the prediction service.
pub struct PredictionApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl PredictionApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url =
            Url::parse(&normalized).with_context(|| format!("Invalid API_BASE_URL: {base_url}"))?;
        Ok(Self {
            client: HttpClientFactory::create_client(timeout),
            base_url,
        })
    }

    pub fn endpoint(&self, route: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(route)
            .with_context(|| format!("Invalid route: {route}"))
    }

    async fn rejection_detail(response: reqwest::Response) -> String {
        match response.json::<ErrorBody>().await {
            Ok(ErrorBody {
                detail: serde_json::Value::String(detail),
            }) => detail,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(e) => {
                debug!("422 without a detail body: {}", e);
                "Request rejected by the prediction service".to_string()
            }
        }
    }
}

#[async_trait]
impl PredictionApi for PredictionApiClient {
    async fn fetch_sample(&self) -> Result<Vec<u8>, String> {
        let url = self.endpoint("download_sample").map_err(|e| e.to_string())?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("sample request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("sample request returned {}", response.status()));
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| format!("sample body unreadable: {e}"))
    }

    async fn predict(&self, file_name: &str, bytes: Vec<u8>) -> PredictOutcome {
        let url = match self.endpoint("upload_file_predict") {
            Ok(url) => url,
            Err(e) => return PredictOutcome::Unreachable(e.to_string()),
        };

        let part = match Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")
        {
            Ok(part) => part,
            Err(e) => return PredictOutcome::Unreachable(e.to_string()),
        };
        let form = Form::new().part("file", part);

        let response = match self.client.post(url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Prediction request failed: {}", e);
                return PredictOutcome::Unreachable(e.to_string());
            }
        };

        match response.status() {
            StatusCode::OK => match response.bytes().await {
                Ok(body) => PredictOutcome::Predictions(body.to_vec()),
                Err(e) => PredictOutcome::Unreachable(format!("body unreadable: {e}")),
            },
            StatusCode::UNPROCESSABLE_ENTITY => {
                PredictOutcome::Rejected(Self::rejection_detail(response).await)
            }
            other => PredictOutcome::Unreachable(format!("HTTP {other}")),
        }
    }
}
