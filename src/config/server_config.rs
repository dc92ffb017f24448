//! Prediction server configuration.

use super::{Lookup, parse_or, process_env};
use crate::domain::transactions::PredictionMode;
use anyhow::Result;
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub sample_path: PathBuf,
    pub prediction_mode: PredictionMode,
    pub max_upload_bytes: usize,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from("models/pipeline.json"),
            sample_path: PathBuf::from("data/sample_file.csv"),
            prediction_mode: PredictionMode::Probability,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_address: lookup("SERVER_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: parse_or(lookup, "SERVER_PORT", defaults.port)?,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            sample_path: lookup("SAMPLE_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sample_path),
            prediction_mode: parse_or(lookup, "PREDICTION_OUTPUT", defaults.prediction_mode)?,
            max_upload_bytes: parse_or(lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup_from;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerEnvConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(config.socket_address(), "0.0.0.0:8000");
        assert_eq!(config.model_path, PathBuf::from("models/pipeline.json"));
        assert_eq!(config.prediction_mode, PredictionMode::Probability);
        assert_eq!(config.max_upload_bytes, 200 * 1024 * 1024);
    }

    #[test]
    fn test_server_config_overrides() {
        let lookup = lookup_from(&[
            ("SERVER_PORT", "9001"),
            ("PREDICTION_OUTPUT", "label"),
            ("MODEL_PATH", "/srv/model.json"),
        ]);
        let config = ServerEnvConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.prediction_mode, PredictionMode::Label);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
    }

    #[test]
    fn test_invalid_prediction_mode_is_rejected() {
        let lookup = lookup_from(&[("PREDICTION_OUTPUT", "score")]);
        assert!(ServerEnvConfig::from_lookup(&lookup).is_err());
    }
}
