use crate::application::prediction::PredictionService;
use crate::config::ServerEnvConfig;
use crate::domain::ml::TransactionClassifier;
use crate::domain::ml::feature_registry::FEATURE_COUNT;
use crate::infrastructure::model_store::ModelStore;
use crate::infrastructure::observability::ServiceMetrics;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Everything the handlers need, built once at startup and read-only after.
pub struct ServiceContext {
    pub predictor: PredictionService,
    pub sample: Vec<u8>,
    pub metrics: ServiceMetrics,
    pub max_upload_bytes: usize,
}

impl ServiceContext {
    pub fn new(
        predictor: PredictionService,
        sample: Vec<u8>,
        metrics: ServiceMetrics,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            predictor,
            sample,
            metrics,
            max_upload_bytes,
        }
    }

    /// Load the model artifact and sample file. Either one missing is fatal.
    pub fn bootstrap(config: &ServerEnvConfig) -> Result<Self> {
        let pipeline = ModelStore::new(&config.model_path)
            .load()
            .context("Model artifact unavailable")?;
        if pipeline.feature_count() != FEATURE_COUNT {
            anyhow::bail!(
                "Model expects {} features, service schema has {}",
                pipeline.feature_count(),
                FEATURE_COUNT
            );
        }

        let sample = std::fs::read(&config.sample_path)
            .with_context(|| format!("Failed to read sample file {:?}", config.sample_path))?;

        let classifier: Arc<dyn TransactionClassifier> = Arc::new(pipeline);
        let predictor = PredictionService::new(classifier, config.prediction_mode);
        info!(
            model = predictor.model_name(),
            mode = ?config.prediction_mode,
            sample_bytes = sample.len(),
            "Service context ready"
        );

        Ok(Self::new(
            predictor,
            sample,
            ServiceMetrics::new()?,
            config.max_upload_bytes,
        ))
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        info!("Service context released");
    }
}
