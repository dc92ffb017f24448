pub mod types;

pub use types::{
    LabeledDataset, Prediction, PredictionMode, PredictionValue, RawFeatures, TransactionBatch,
};
