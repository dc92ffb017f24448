pub mod csv_codec;
pub mod service;

pub use service::{PredictionOutput, PredictionService};
