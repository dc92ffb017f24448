// Domain-specific error types
pub mod errors;

// Feature schema, preprocessing and classifiers
pub mod ml;

// Deployment maintenance (commands, targets, reports)
pub mod ops;

// Port interfaces
pub mod ports;

// Transactions and predictions
pub mod transactions;
