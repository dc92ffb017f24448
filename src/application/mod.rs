pub mod client;
pub mod ops;
pub mod prediction;
pub mod training;
