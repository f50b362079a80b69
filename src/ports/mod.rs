//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the prediction pipeline and external systems (model files,
//! databases).

mod classifier;
mod storage;

pub use classifier::{check_row, Classifier, ScoringError};
pub use storage::{bounded_limit, PredictionStore, STATS_SCAN_LIMIT};
