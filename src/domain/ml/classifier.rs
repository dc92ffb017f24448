use crate::domain::errors::PipelineError;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;
use std::str::FromStr;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Classifier family selected at training time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    /// Random forest fitted on the 0/1 target; the averaged tree output is
    /// the positive-class probability.
    #[default]
    RandomForest,
    /// Baseline that always predicts the training positive rate.
    Prior,
}

impl FromStr for ClassifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random-forest" | "random_forest" | "forest" => Ok(ClassifierKind::RandomForest),
            "prior" | "dummy" => Ok(ClassifierKind::Prior),
            _ => anyhow::bail!(
                "Invalid classifier: {}. Must be 'random-forest' or 'prior'",
                s
            ),
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierKind::RandomForest => write!(f, "random-forest"),
            ClassifierKind::Prior => write!(f, "prior"),
        }
    }
}

/// Random forest hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

/// A fitted binary classifier producing positive-class probabilities.
#[derive(Serialize, Deserialize)]
pub enum FittedClassifier {
    RandomForest(Forest),
    Prior { positive_rate: f64 },
}

impl fmt::Debug for FittedClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FittedClassifier::RandomForest(_) => write!(f, "FittedClassifier::RandomForest"),
            FittedClassifier::Prior { positive_rate } => {
                write!(f, "FittedClassifier::Prior({positive_rate:.4})")
            }
        }
    }
}

impl FittedClassifier {
    /// Fit on already preprocessed rows. Consumes the rows so the training
    /// matrix is the only full copy alive while the forest is built.
    pub fn fit(
        kind: ClassifierKind,
        params: &ForestParams,
        rows: Vec<Vec<f64>>,
        labels: &[u8],
    ) -> Result<Self, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(PipelineError::LabelCountMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        match kind {
            ClassifierKind::Prior => {
                let positives = labels.iter().filter(|&&l| l == 1).count();
                Ok(FittedClassifier::Prior {
                    positive_rate: positives as f64 / labels.len() as f64,
                })
            }
            ClassifierKind::RandomForest => {
                let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| PipelineError::Backend {
                    reason: format!("Matrix error: {}", e),
                })?;
                drop(rows);
                let y: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();

                let forest_params = RandomForestRegressorParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_samples_split)
                    .with_seed(params.seed);

                let forest = RandomForestRegressor::fit(&x, &y, forest_params).map_err(|e| {
                    PipelineError::Backend {
                        reason: format!("Training error: {}", e),
                    }
                })?;
                Ok(FittedClassifier::RandomForest(forest))
            }
        }
    }

    pub fn kind(&self) -> ClassifierKind {
        match self {
            FittedClassifier::RandomForest(_) => ClassifierKind::RandomForest,
            FittedClassifier::Prior { .. } => ClassifierKind::Prior,
        }
    }

    /// Positive-class probability per row, clamped to [0, 1].
    pub fn predict_proba(&self, rows: Vec<Vec<f64>>) -> Result<Vec<f64>, PipelineError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        match self {
            FittedClassifier::Prior { positive_rate } => Ok(vec![*positive_rate; rows.len()]),
            FittedClassifier::RandomForest(forest) => {
                let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| PipelineError::Backend {
                    reason: format!("Matrix error: {}", e),
                })?;
                let scores: Vec<f64> = forest.predict(&x).map_err(|e| PipelineError::Backend {
                    reason: format!("Predict error: {}", e),
                })?;
                Ok(scores.into_iter().map(|s| s.clamp(0.0, 1.0)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = i as f64 / 40.0;
            rows.push(vec![x, 1.0 - x]);
            labels.push(u8::from(x >= 0.5));
        }
        (rows, labels)
    }

    #[test]
    fn test_prior_predicts_positive_rate() {
        let clf = FittedClassifier::fit(
            ClassifierKind::Prior,
            &ForestParams::default(),
            vec![vec![0.0]; 4],
            &[1, 0, 0, 0],
        )
        .unwrap();
        assert_eq!(clf.kind(), ClassifierKind::Prior);
        assert_eq!(clf.predict_proba(vec![vec![1.0]; 2]).unwrap(), vec![0.25, 0.25]);
    }

    #[test]
    fn test_forest_learns_separable_data() {
        let (rows, labels) = separable();
        let params = ForestParams {
            n_trees: 10,
            max_depth: 4,
            min_samples_split: 2,
            seed: 7,
        };
        let clf =
            FittedClassifier::fit(ClassifierKind::RandomForest, &params, rows, &labels).unwrap();

        let proba = clf
            .predict_proba(vec![vec![0.05, 0.95], vec![0.95, 0.05]])
            .unwrap();
        assert!(proba[0] < 0.5, "low end scored {}", proba[0]);
        assert!(proba[1] > 0.5, "high end scored {}", proba[1]);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_fit_rejects_label_mismatch() {
        let err = FittedClassifier::fit(
            ClassifierKind::Prior,
            &ForestParams::default(),
            vec![vec![0.0]; 3],
            &[1, 0],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::LabelCountMismatch { rows: 3, labels: 2 }
        ));
    }

    #[test]
    fn test_empty_batch_predicts_nothing() {
        let clf = FittedClassifier::Prior { positive_rate: 0.1 };
        assert!(clf.predict_proba(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_classifier_kind_parsing() {
        assert_eq!(
            "random-forest".parse::<ClassifierKind>().unwrap(),
            ClassifierKind::RandomForest
        );
        assert_eq!("prior".parse::<ClassifierKind>().unwrap(), ClassifierKind::Prior);
        assert!("svm".parse::<ClassifierKind>().is_err());
    }
}
