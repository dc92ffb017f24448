use super::split::{DatasetSplit, stratified_split};
use crate::domain::ml::{ClassificationReport, FittedPipeline, PipelineConfig, TransactionClassifier};
use crate::domain::transactions::LabeledDataset;
use anyhow::Context;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub pipeline: PipelineConfig,
    /// Fraction of rows held out for validation
    pub valid_size: f64,
    pub seed: u64,
    /// Train on every row and skip validation scoring
    pub no_split: bool,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            valid_size: 0.3,
            seed: 42,
            no_split: false,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> anyhow::Result<()> {
        let threshold = self.pipeline.decision_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("decision threshold must be in [0, 1], got {}", threshold);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub pipeline: FittedPipeline,
    pub train_report: ClassificationReport,
    pub validation_report: Option<ClassificationReport>,
    /// `None` when trained on every row
    pub split: Option<DatasetSplit>,
}

/// Fits the preprocessing + classifier pipeline on the training side of a
/// stratified split and scores both sides.
pub struct Trainer {
    options: TrainingOptions,
}

impl Trainer {
    pub fn new(mut options: TrainingOptions) -> Self {
        options.pipeline.forest.seed = options.seed;
        Self { options }
    }

    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    pub fn train(&self, dataset: &LabeledDataset) -> anyhow::Result<TrainingOutcome> {
        self.options.validate()?;
        if dataset.is_empty() {
            anyhow::bail!("training dataset has no rows");
        }
        info!(
            rows = dataset.len(),
            positives = dataset.positive_count(),
            "Training on labeled dataset"
        );

        let threshold = self.options.pipeline.decision_threshold;

        if self.options.no_split {
            let pipeline = self.fit(dataset)?;
            let train_report = score(&pipeline, dataset, threshold)?;
            return Ok(TrainingOutcome {
                pipeline,
                train_report,
                validation_report: None,
                split: None,
            });
        }

        let split = stratified_split(&dataset.labels, self.options.valid_size, self.options.seed)?;
        let train_set = dataset.select(&split.train);
        let validation_set = dataset.select(&split.validation);
        info!(
            train = train_set.len(),
            validation = validation_set.len(),
            "Stratified split"
        );

        let pipeline = self.fit(&train_set)?;
        let train_report = score(&pipeline, &train_set, threshold)?;
        let validation_report = score(&pipeline, &validation_set, threshold)?;

        Ok(TrainingOutcome {
            pipeline,
            train_report,
            validation_report: Some(validation_report),
            split: Some(split),
        })
    }

    fn fit(&self, data: &LabeledDataset) -> anyhow::Result<FittedPipeline> {
        let start = Instant::now();
        let pipeline = FittedPipeline::fit(&data.features, &data.labels, &self.options.pipeline)
            .context("fitting pipeline")?;
        info!(
            classifier = %self.options.pipeline.classifier,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline fitted"
        );
        Ok(pipeline)
    }
}

fn score(
    pipeline: &FittedPipeline,
    data: &LabeledDataset,
    threshold: f64,
) -> anyhow::Result<ClassificationReport> {
    let probabilities = pipeline
        .predict_proba(&data.features)
        .context("scoring split")?;
    Ok(ClassificationReport::compute(&data.labels, &probabilities, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{ClassifierKind, Preprocessor};

    /// Separable data: positives sit high on the first feature.
    fn dataset(n: usize) -> LabeledDataset {
        let mut data = LabeledDataset::default();
        for i in 0..n {
            let label = u8::from(i % 4 == 0);
            let base = if label == 1 { 10.0 } else { 0.0 };
            data.ids.push(format!("train_{i}"));
            data.features
                .push(vec![Some(base + (i % 3) as f64), Some((i % 5) as f64)]);
            data.labels.push(label);
        }
        data
    }

    fn prior_options() -> TrainingOptions {
        let mut options = TrainingOptions::default();
        options.pipeline.classifier = ClassifierKind::Prior;
        options
    }

    #[test]
    fn test_prior_baseline_reports_positive_rate() {
        let outcome = Trainer::new(prior_options()).train(&dataset(40)).unwrap();
        let report = outcome.validation_report.unwrap();
        assert_eq!(report.samples, 12);
        // constant 0.25 score is below threshold: nothing predicted positive
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.roc_auc, Some(0.5));
    }

    #[test]
    fn test_no_split_uses_every_row() {
        let mut options = prior_options();
        options.no_split = true;
        let outcome = Trainer::new(options).train(&dataset(40)).unwrap();
        assert!(outcome.split.is_none());
        assert!(outcome.validation_report.is_none());
        assert_eq!(outcome.pipeline.training_rows, 40);
    }

    #[test]
    fn test_preprocessing_sees_only_training_rows() {
        let mut data = dataset(40);
        let outcome = Trainer::new(prior_options()).train(&data).unwrap();
        let split = outcome.split.unwrap();

        // poison the validation rows; refitting must not change anything
        for &i in &split.validation {
            data.features[i] = vec![Some(1e9), None];
        }
        let again = Trainer::new(prior_options()).train(&data).unwrap();
        assert_eq!(again.pipeline.preprocessor, outcome.pipeline.preprocessor);

        let train_rows: Vec<_> = split.train.iter().map(|&i| data.features[i].clone()).collect();
        let expected = Preprocessor::fit(&train_rows, Default::default()).unwrap();
        assert_eq!(outcome.pipeline.preprocessor, expected);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        assert!(Trainer::new(prior_options()).train(&LabeledDataset::default()).is_err());
    }

    #[test]
    fn test_threshold_outside_unit_interval_is_rejected() {
        for threshold in [2.0, -0.1, f64::NAN] {
            let mut options = prior_options();
            options.pipeline.decision_threshold = threshold;
            assert!(options.validate().is_err());
            assert!(Trainer::new(options).train(&dataset(40)).is_err());
        }

        let mut options = prior_options();
        options.pipeline.decision_threshold = 1.0;
        assert!(options.validate().is_ok());
    }
}
