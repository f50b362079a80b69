//! Application layer: Use cases and services.
//!
//! This module orchestrates the model artifact and the prediction store to
//! implement the use cases behind the HTTP API.

mod classifier;
mod prediction;

pub use classifier::RiskClassifier;
pub use prediction::{
    DatabaseState, DisplayPrediction, HealthReport, ModelInfo, PredictionResponse,
    PredictionService, PredictionStats, RecentPredictions, RiskDistribution, ServiceInfo,
    RECENT_PREDICTIONS_LIMIT,
};
