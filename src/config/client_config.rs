use super::{Lookup, parse_or, process_env};
use anyhow::Result;
use std::time::Duration;

/// UI client configuration
#[derive(Debug, Clone)]
pub struct ClientEnvConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl ClientEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            api_base_url: lookup("API_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8000".to_string()),
            request_timeout: Duration::from_secs(parse_or(lookup, "API_TIMEOUT_SECS", 120u64)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup_from;

    #[test]
    fn test_client_config() {
        let config = ClientEnvConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");

        let config =
            ClientEnvConfig::from_lookup(&lookup_from(&[("API_BASE_URL", "http://backend:8000")]))
                .unwrap();
        assert_eq!(config.api_base_url, "http://backend:8000");
    }
}
