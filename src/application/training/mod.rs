pub mod split;
pub mod trainer;

pub use split::{DatasetSplit, stratified_split};
pub use trainer::{Trainer, TrainingOptions, TrainingOutcome};
