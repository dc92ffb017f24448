use crate::domain::ops::ProbeResult;
use crate::domain::ports::HealthProbe;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// `GET` probe: healthy only on a 200 answer within the timeout.
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
        }
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &str) -> ProbeResult {
        match self.client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => ProbeResult::Healthy,
            Ok(response) => ProbeResult::Unhealthy {
                status: response.status().as_u16(),
            },
            Err(e) => {
                debug!(url, "Probe failed: {}", e);
                ProbeResult::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        // bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = HttpHealthProbe::new(Duration::from_secs(2));
        let result = probe.probe(&format!("http://127.0.0.1:{port}/")).await;
        assert!(matches!(result, ProbeResult::Unreachable { .. }));
    }
}
