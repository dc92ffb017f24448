//! Fitted feature transforms applied ahead of the classifier.
//!
//! Both transforms learn their parameters from training rows only; applying
//! them to other rows never changes those parameters.

use crate::domain::errors::PipelineError;
use crate::domain::transactions::RawFeatures;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Statistic used to fill missing feature values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeStrategy {
    #[default]
    Mean,
    Median,
}

impl FromStr for ImputeStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            _ => anyhow::bail!("Invalid impute strategy: {}. Must be 'mean' or 'median'", s),
        }
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeStrategy::Mean => write!(f, "mean"),
            ImputeStrategy::Median => write!(f, "median"),
        }
    }
}

fn check_width(row: &[Option<f64>], expected: usize) -> Result<(), PipelineError> {
    if row.len() != expected {
        return Err(PipelineError::FeatureWidthMismatch {
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

/// Per-column fill values learned from training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
    statistics: Vec<f64>,
}

impl SimpleImputer {
    /// Learn one statistic per column. Non-finite values count as missing.
    /// A column with no observed value falls back to 0.0.
    pub fn fit(rows: &[RawFeatures], strategy: ImputeStrategy) -> Result<Self, PipelineError> {
        let width = rows.first().ok_or(PipelineError::EmptyTrainingSet)?.len();
        for row in rows {
            check_width(row, width)?;
        }

        let statistics = (0..width)
            .map(|col| {
                let mut observed: Vec<f64> = rows
                    .iter()
                    .filter_map(|row| row[col].filter(|v| v.is_finite()))
                    .collect();
                column_statistic(&mut observed, strategy)
            })
            .collect();

        Ok(Self {
            strategy,
            statistics,
        })
    }

    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }

    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }

    pub fn width(&self) -> usize {
        self.statistics.len()
    }

    pub fn transform(&self, rows: &[RawFeatures]) -> Result<Vec<Vec<f64>>, PipelineError> {
        rows.iter()
            .map(|row| {
                check_width(row, self.width())?;
                Ok(row
                    .iter()
                    .zip(&self.statistics)
                    .map(|(value, fill)| value.filter(|v| v.is_finite()).unwrap_or(*fill))
                    .collect())
            })
            .collect()
    }
}

fn column_statistic(observed: &mut [f64], strategy: ImputeStrategy) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    match strategy {
        ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
        ImputeStrategy::Median => {
            observed.sort_by(|a, b| a.total_cmp(b));
            let mid = observed.len() / 2;
            if observed.len() % 2 == 0 {
                (observed[mid - 1] + observed[mid]) / 2.0
            } else {
                observed[mid]
            }
        }
    }
}

/// Rescales every column to [0, 1] using the training minimum and maximum.
/// Values outside the training range are not clipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl MinMaxScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PipelineError> {
        let width = rows.first().ok_or(PipelineError::EmptyTrainingSet)?.len();
        let mut data_min = vec![f64::INFINITY; width];
        let mut data_max = vec![f64::NEG_INFINITY; width];

        for row in rows {
            if row.len() != width {
                return Err(PipelineError::FeatureWidthMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            for (col, &value) in row.iter().enumerate() {
                data_min[col] = data_min[col].min(value);
                data_max[col] = data_max[col].max(value);
            }
        }

        Ok(Self { data_min, data_max })
    }

    pub fn data_min(&self) -> &[f64] {
        &self.data_min
    }

    pub fn data_max(&self) -> &[f64] {
        &self.data_max
    }

    pub fn transform(&self, rows: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>, PipelineError> {
        rows.into_iter()
            .map(|mut row| {
                if row.len() != self.data_min.len() {
                    return Err(PipelineError::FeatureWidthMismatch {
                        expected: self.data_min.len(),
                        actual: row.len(),
                    });
                }
                for (col, value) in row.iter_mut().enumerate() {
                    let range = self.data_max[col] - self.data_min[col];
                    // constant training column: every value maps onto its offset from the minimum
                    *value = if range > 0.0 {
                        (*value - self.data_min[col]) / range
                    } else {
                        *value - self.data_min[col]
                    };
                }
                Ok(row)
            })
            .collect()
    }
}

/// Imputation followed by min-max scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub imputer: SimpleImputer,
    pub scaler: MinMaxScaler,
}

impl Preprocessor {
    pub fn fit(rows: &[RawFeatures], strategy: ImputeStrategy) -> Result<Self, PipelineError> {
        let imputer = SimpleImputer::fit(rows, strategy)?;
        let scaler = MinMaxScaler::fit(&imputer.transform(rows)?)?;
        Ok(Self { imputer, scaler })
    }

    pub fn width(&self) -> usize {
        self.imputer.width()
    }

    pub fn transform(&self, rows: &[RawFeatures]) -> Result<Vec<Vec<f64>>, PipelineError> {
        self.scaler.transform(self.imputer.transform(rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<RawFeatures> {
        vec![
            vec![Some(1.0), Some(10.0), None],
            vec![Some(3.0), None, None],
            vec![None, Some(30.0), None],
            vec![Some(8.0), Some(20.0), None],
        ]
    }

    #[test]
    fn test_mean_imputer_statistics() {
        let imputer = SimpleImputer::fit(&rows(), ImputeStrategy::Mean).unwrap();
        assert_eq!(imputer.statistics(), &[4.0, 20.0, 0.0]);

        let filled = imputer.transform(&rows()).unwrap();
        assert_eq!(filled[1], vec![3.0, 20.0, 0.0]);
        assert_eq!(filled[2], vec![4.0, 30.0, 0.0]);
    }

    #[test]
    fn test_median_imputer_statistics() {
        let imputer = SimpleImputer::fit(&rows(), ImputeStrategy::Median).unwrap();
        // col 0 observed [1, 3, 8] -> 3; col 1 observed [10, 20, 30] -> 20
        assert_eq!(imputer.statistics(), &[3.0, 20.0, 0.0]);

        let even = vec![vec![Some(1.0)], vec![Some(4.0)], vec![Some(2.0)], vec![Some(10.0)]];
        let imputer = SimpleImputer::fit(&even, ImputeStrategy::Median).unwrap();
        assert_eq!(imputer.statistics(), &[3.0]);
    }

    #[test]
    fn test_imputer_treats_non_finite_as_missing() {
        let rows = vec![
            vec![Some(2.0)],
            vec![Some(f64::NAN)],
            vec![Some(f64::INFINITY)],
            vec![Some(4.0)],
        ];
        let imputer = SimpleImputer::fit(&rows, ImputeStrategy::Mean).unwrap();
        assert_eq!(imputer.statistics(), &[3.0]);

        let filled = imputer.transform(&rows).unwrap();
        assert_eq!(filled, vec![vec![2.0], vec![3.0], vec![3.0], vec![4.0]]);
    }

    #[test]
    fn test_imputer_rejects_width_mismatch() {
        let imputer = SimpleImputer::fit(&rows(), ImputeStrategy::Mean).unwrap();
        let err = imputer.transform(&[vec![Some(1.0)]]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FeatureWidthMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_imputer_rejects_empty_training_set() {
        assert!(matches!(
            SimpleImputer::fit(&[], ImputeStrategy::Mean),
            Err(PipelineError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_min_max_scaler() {
        let scaler = MinMaxScaler::fit(&[vec![0.0, 5.0], vec![10.0, 5.0], vec![5.0, 5.0]]).unwrap();
        assert_eq!(scaler.data_min(), &[0.0, 5.0]);
        assert_eq!(scaler.data_max(), &[10.0, 5.0]);

        let scaled = scaler.transform(vec![vec![2.5, 5.0], vec![20.0, 7.0]]).unwrap();
        assert_eq!(scaled[0], vec![0.25, 0.0]);
        // out of range values are not clipped
        assert_eq!(scaled[1], vec![2.0, 2.0]);
    }

    #[test]
    fn test_preprocessor_fit_transform() {
        let prep = Preprocessor::fit(&rows(), ImputeStrategy::Mean).unwrap();
        let out = prep.transform(&rows()).unwrap();
        // col 0 after imputation: [1, 3, 4, 8] -> min 1, max 8
        assert!((out[0][0] - 0.0).abs() < 1e-12);
        assert!((out[3][0] - 1.0).abs() < 1e-12);
        assert!((out[1][0] - 2.0 / 7.0).abs() < 1e-12);
        assert_eq!(prep.width(), 3);
    }

    #[test]
    fn test_impute_strategy_parsing() {
        assert_eq!("MEDIAN".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::Median);
        assert!("mode".parse::<ImputeStrategy>().is_err());
    }
}
