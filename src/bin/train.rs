use anyhow::Result;
use clap::Parser;
use santander::application::training::{Trainer, TrainingOptions};
use santander::domain::ml::{ClassifierKind, ForestParams, ImputeStrategy, PipelineConfig};
use santander::infrastructure::dataset_source::DEFAULT_DATASET_URL;
use santander::infrastructure::{DatasetSource, ModelStore};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the transaction classifier", long_about = None)]
struct Args {
    /// Path to the labeled training CSV (downloaded when absent)
    #[arg(long, default_value = "data/train.csv")]
    input: PathBuf,

    /// Where to fetch the training CSV from when `--input` does not exist
    #[arg(long, default_value = DEFAULT_DATASET_URL)]
    dataset_url: String,

    /// Path to the output model artifact
    #[arg(long, default_value = "models/pipeline.json")]
    output: PathBuf,

    /// Seed for the split and the forest
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Fraction of rows held out for validation
    #[arg(long, default_value_t = 0.3)]
    valid_size: f64,

    /// Imputation statistic: mean or median
    #[arg(long, default_value = "mean")]
    impute_strategy: ImputeStrategy,

    /// Classifier: random-forest or prior
    #[arg(long, default_value = "random-forest")]
    classifier: ClassifierKind,

    /// Number of trees in the random forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum depth of trees
    #[arg(long, default_value_t = 10)]
    max_depth: u16,

    /// Minimum samples required to split an internal node
    #[arg(long, default_value_t = 5)]
    min_split: usize,

    /// Probability at or above which a row is labeled 1
    #[arg(long, default_value_t = 0.5)]
    threshold: f64,

    /// Disable train/validation split (train on 100% of data). Use after validation.
    #[arg(long)]
    no_split: bool,
}

impl Args {
    fn options(&self) -> TrainingOptions {
        TrainingOptions {
            pipeline: PipelineConfig {
                impute_strategy: self.impute_strategy,
                classifier: self.classifier,
                forest: ForestParams {
                    n_trees: self.n_trees,
                    max_depth: self.max_depth,
                    min_samples_split: self.min_split,
                    seed: self.seed,
                },
                decision_threshold: self.threshold,
            },
            valid_size: self.valid_size,
            seed: self.seed,
            no_split: self.no_split,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    args.options().validate()?;

    let source = DatasetSource::new(&args.input, args.dataset_url.clone());
    source.ensure_local().await?;
    let dataset = source.load().await?;

    let n = dataset.len();
    let positives = dataset.positive_count();
    println!("\nTarget Distribution:");
    println!("  Total:    {}", n);
    println!(
        "  Positive: {} ({:.1}%)",
        positives,
        positives as f64 / n.max(1) as f64 * 100.0
    );
    println!();

    let trainer = Trainer::new(args.options());
    info!(
        classifier = %args.classifier,
        impute = %args.impute_strategy,
        "Training started"
    );
    let outcome = tokio::task::spawn_blocking(move || trainer.train(&dataset)).await??;

    println!("Training set metrics:");
    println!("{}", outcome.train_report);
    if let Some(report) = &outcome.validation_report {
        println!("\nValidation set metrics:");
        println!("{}", report);
    } else {
        println!("\nValidation skipped (--no-split).");
    }

    ModelStore::new(&args.output).save(&outcome.pipeline)?;
    println!("\nModel saved to {:?}", args.output);
    Ok(())
}
