use super::classifier::{ClassifierKind, FittedClassifier, ForestParams};
use super::feature_registry;
use super::preprocessing::{ImputeStrategy, Preprocessor};
use super::predictor::TransactionClassifier;
use crate::domain::errors::PipelineError;
use crate::domain::transactions::RawFeatures;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settings used to fit a [`FittedPipeline`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub impute_strategy: ImputeStrategy,
    pub classifier: ClassifierKind,
    pub forest: ForestParams,
    pub decision_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            impute_strategy: ImputeStrategy::Mean,
            classifier: ClassifierKind::RandomForest,
            forest: ForestParams::default(),
            decision_threshold: 0.5,
        }
    }
}

/// Preprocessing and classifier fitted together; this is the artifact the
/// training program writes and the prediction service loads.
#[derive(Debug, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub feature_names: Vec<String>,
    pub preprocessor: Preprocessor,
    pub classifier: FittedClassifier,
    pub decision_threshold: f64,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
}

impl FittedPipeline {
    /// Fit preprocessing on `rows`, then the classifier on the transformed rows.
    pub fn fit(
        rows: &[RawFeatures],
        labels: &[u8],
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if rows.len() != labels.len() {
            return Err(PipelineError::LabelCountMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        let preprocessor = Preprocessor::fit(rows, config.impute_strategy)?;
        let processed = preprocessor.transform(rows)?;
        let classifier =
            FittedClassifier::fit(config.classifier, &config.forest, processed, labels)?;

        let feature_names = if preprocessor.width() == feature_registry::FEATURE_COUNT {
            feature_registry::feature_names().to_vec()
        } else {
            (0..preprocessor.width()).map(|i| format!("f{i}")).collect()
        };

        Ok(Self {
            feature_names,
            preprocessor,
            classifier,
            decision_threshold: config.decision_threshold,
            trained_at: Utc::now(),
            training_rows: rows.len(),
        })
    }

    pub fn feature_count(&self) -> usize {
        self.preprocessor.width()
    }

    pub fn predict(&self, rows: &[RawFeatures]) -> Result<Vec<u8>, PipelineError> {
        Ok(self
            .predict_proba(rows)?
            .into_iter()
            .map(|p| u8::from(p >= self.decision_threshold))
            .collect())
    }
}

impl TransactionClassifier for FittedPipeline {
    fn predict_proba(&self, rows: &[RawFeatures]) -> Result<Vec<f64>, PipelineError> {
        let processed = self.preprocessor.transform(rows)?;
        self.classifier.predict_proba(processed)
    }

    fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    fn feature_count(&self) -> usize {
        self.preprocessor.width()
    }

    fn name(&self) -> &str {
        match self.classifier.kind() {
            ClassifierKind::RandomForest => "imputer+minmax+random-forest",
            ClassifierKind::Prior => "imputer+minmax+prior",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: ClassifierKind) -> PipelineConfig {
        PipelineConfig {
            classifier: kind,
            forest: ForestParams {
                n_trees: 5,
                max_depth: 3,
                min_samples_split: 2,
                seed: 1,
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_pipeline_imputes_before_predicting() {
        let rows = vec![
            vec![Some(0.0), Some(1.0)],
            vec![Some(1.0), None],
            vec![None, Some(3.0)],
            vec![Some(4.0), Some(2.0)],
        ];
        let pipeline = FittedPipeline::fit(&rows, &[0, 0, 1, 1], &config(ClassifierKind::Prior))
            .unwrap();

        assert_eq!(pipeline.feature_count(), 2);
        assert_eq!(pipeline.feature_names, vec!["f0", "f1"]);
        assert_eq!(pipeline.training_rows, 4);

        let proba = pipeline.predict_proba(&[vec![None, None]]).unwrap();
        assert_eq!(proba, vec![0.5]);
        assert_eq!(pipeline.predict(&[vec![None, None]]).unwrap(), vec![1]);
    }

    #[test]
    fn test_pipeline_rejects_wrong_width_at_inference() {
        let rows = vec![vec![Some(0.0), Some(1.0)], vec![Some(1.0), Some(0.0)]];
        let pipeline =
            FittedPipeline::fit(&rows, &[0, 1], &config(ClassifierKind::Prior)).unwrap();

        let err = pipeline.predict_proba(&[vec![Some(1.0)]]).unwrap_err();
        assert!(matches!(err, PipelineError::FeatureWidthMismatch { .. }));
    }

    #[test]
    fn test_pipeline_round_trips_through_json() {
        let rows: Vec<RawFeatures> = (0..20)
            .map(|i| vec![Some(i as f64), Some((20 - i) as f64)])
            .collect();
        let labels: Vec<u8> = (0..20).map(|i| u8::from(i >= 10)).collect();
        let pipeline =
            FittedPipeline::fit(&rows, &labels, &config(ClassifierKind::RandomForest)).unwrap();

        let json = serde_json::to_string(&pipeline).unwrap();
        let restored: FittedPipeline = serde_json::from_str(&json).unwrap();

        let probe = vec![vec![Some(2.0), Some(18.0)], vec![Some(17.0), None]];
        assert_eq!(
            pipeline.predict_proba(&probe).unwrap(),
            restored.predict_proba(&probe).unwrap()
        );
        assert_eq!(restored.preprocessor, pipeline.preprocessor);
    }
}
