use crate::domain::errors::PipelineError;
use crate::domain::transactions::RawFeatures;

/// Interface for fitted transaction classifiers
pub trait TransactionClassifier: Send + Sync {
    /// Positive-class probability (0.0 to 1.0) for every row, in order.
    /// Missing cells are handled by the classifier's own preprocessing.
    fn predict_proba(&self, rows: &[RawFeatures]) -> Result<Vec<f64>, PipelineError>;

    /// Probability at or above which a row is labeled positive
    fn decision_threshold(&self) -> f64 {
        0.5
    }

    /// Number of features each row must carry
    fn feature_count(&self) -> usize;

    /// Get model name/type
    fn name(&self) -> &str;
}
