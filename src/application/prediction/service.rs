use super::csv_codec;
use crate::domain::errors::{PipelineError, PredictionError};
use crate::domain::ml::TransactionClassifier;
use crate::domain::transactions::{Prediction, PredictionMode, PredictionValue, TransactionBatch};
use std::sync::Arc;
use tracing::{debug, info};

/// Encoded predictions plus bookkeeping for logs and metrics
#[derive(Debug, Clone)]
pub struct PredictionOutput {
    pub csv: Vec<u8>,
    pub rows: usize,
    pub imputed_cells: usize,
}

/// Turns uploaded transaction files into prediction files.
///
/// Holds a read-only classifier handle; cloning shares the same model.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn TransactionClassifier>,
    mode: PredictionMode,
}

impl PredictionService {
    pub fn new(classifier: Arc<dyn TransactionClassifier>, mode: PredictionMode) -> Self {
        Self { classifier, mode }
    }

    pub fn mode(&self) -> PredictionMode {
        self.mode
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    /// Parse, validate, predict and encode. Nothing is predicted unless the
    /// whole upload is valid.
    pub fn predict_csv(&self, bytes: &[u8]) -> Result<PredictionOutput, PredictionError> {
        let batch = csv_codec::parse_upload(bytes)?;
        let imputed_cells = batch.missing_cells();
        if imputed_cells > 0 {
            info!(
                rows = batch.len(),
                imputed_cells, "Upload has missing values, imputing before inference"
            );
        }

        let predictions = self.predict_batch(&batch)?;
        let csv = csv_codec::write_predictions(&predictions).map_err(|e| {
            PredictionError::Encoding {
                reason: e.to_string(),
            }
        })?;

        Ok(PredictionOutput {
            csv,
            rows: predictions.len(),
            imputed_cells,
        })
    }

    /// Run the classifier on the feature columns and reattach the IDs.
    pub fn predict_batch(&self, batch: &TransactionBatch) -> Result<Vec<Prediction>, PipelineError> {
        let probabilities = self.classifier.predict_proba(&batch.features)?;
        if probabilities.len() != batch.len() {
            return Err(PipelineError::Backend {
                reason: format!(
                    "classifier returned {} scores for {} rows",
                    probabilities.len(),
                    batch.len()
                ),
            });
        }
        debug!(rows = batch.len(), model = self.classifier.name(), "Batch scored");

        let threshold = self.classifier.decision_threshold();
        Ok(batch
            .ids
            .iter()
            .zip(probabilities)
            .map(|(id, p)| Prediction {
                id: id.clone(),
                value: PredictionValue::from_probability(p, self.mode, threshold),
            })
            .collect())
    }
}
