pub mod classifier;
pub mod feature_registry;
pub mod metrics;
pub mod pipeline;
pub mod predictor;
pub mod preprocessing;

pub use classifier::{ClassifierKind, FittedClassifier, ForestParams};
pub use metrics::ClassificationReport;
pub use pipeline::{FittedPipeline, PipelineConfig};
pub use predictor::TransactionClassifier;
pub use preprocessing::{ImputeStrategy, MinMaxScaler, Preprocessor, SimpleImputer};
