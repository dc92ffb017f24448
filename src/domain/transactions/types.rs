use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feature row as uploaded; `None` marks a missing cell.
pub type RawFeatures = Vec<Option<f64>>;

/// Unlabeled transactions parsed from an upload, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionBatch {
    pub ids: Vec<String>,
    pub features: Vec<RawFeatures>,
}

impl TransactionBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of cells that need imputation.
    pub fn missing_cells(&self) -> usize {
        self.features
            .iter()
            .map(|row| row.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

/// Labeled transactions used for training.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub ids: Vec<String>,
    pub features: Vec<RawFeatures>,
    pub labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Copy the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> LabeledDataset {
        LabeledDataset {
            ids: indices.iter().map(|&i| self.ids[i].clone()).collect(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// What the service writes into the prediction column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PredictionMode {
    #[default]
    Probability,
    Label,
}

impl FromStr for PredictionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "probability" | "proba" => Ok(PredictionMode::Probability),
            "label" => Ok(PredictionMode::Label),
            _ => anyhow::bail!(
                "Invalid PREDICTION_OUTPUT: {}. Must be 'probability' or 'label'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredictionValue {
    Label(u8),
    Probability(f64),
}

impl PredictionValue {
    pub fn from_probability(probability: f64, mode: PredictionMode, threshold: f64) -> Self {
        match mode {
            PredictionMode::Probability => {
                PredictionValue::Probability((probability * 1000.0).round() / 1000.0)
            }
            PredictionMode::Label => PredictionValue::Label(u8::from(probability >= threshold)),
        }
    }
}

impl fmt::Display for PredictionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionValue::Label(label) => write!(f, "{}", label),
            PredictionValue::Probability(p) => write!(f, "{:.3}", p),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: String,
    pub value: PredictionValue,
}
