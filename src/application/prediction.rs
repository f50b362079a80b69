//! Prediction service: Orchestrates scoring and persistence.
//!
//! This service coordinates:
//! - Feature assembly and scoring (via [`RiskClassifier`])
//! - Persisting every prediction
//! - Display rows and aggregate statistics over stored predictions
//!
//! Persistence never fails a request. A failed insert yields id `0` and the
//! current time; a failed read yields an empty list.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::classifier::RiskClassifier;
use crate::adapters::{ArtifactKind, ModelArtifact};
use crate::domain::{PatientObservation, PredictionRecord, RiskLevel};
use crate::ports::{PredictionStore, ScoringError, STATS_SCAN_LIMIT};

/// Rows returned by `GET /recent-predictions`.
pub const RECENT_PREDICTIONS_LIMIT: usize = 10;

/// Result of one `/predict` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    /// Store-assigned id, `0` when the row could not be saved
    pub prediction_id: i64,
    pub patient_name: String,
    pub prediction: u8,
    pub probability_no_disease: f64,
    pub probability_disease: f64,
    pub risk_level: RiskLevel,
    pub model_used: String,
    pub prediction_date: String,
}

/// A stored prediction shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPrediction {
    pub id: i64,
    pub patient_name: String,
    pub age: i32,
    pub sex: &'static str,
    pub prediction: &'static str,
    pub disease_probability: f64,
    pub risk_level: RiskLevel,
    pub prediction_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentPredictions {
    pub total_predictions: usize,
    pub predictions: Vec<DisplayPrediction>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

/// Aggregates over the most recent stored predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PredictionStats {
    pub total_predictions: usize,
    pub disease_predictions: usize,
    pub no_disease_predictions: usize,
    /// Percentage of disease predictions, one decimal
    pub disease_rate: f64,
    pub risk_distribution: RiskDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub model: String,
    pub accuracy: Option<f64>,
    pub features: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub accuracy: Option<f64>,
    pub features: Vec<String>,
    pub total_features: usize,
    pub kind: ArtifactKind,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: DatabaseState,
    pub total_predictions_stored: u64,
}

/// Service for scoring observations and reading back stored predictions.
pub struct PredictionService {
    classifier: RiskClassifier,
    store: Arc<dyn PredictionStore>,
}

impl PredictionService {
    /// Create a new prediction service.
    pub fn new(artifact: Arc<ModelArtifact>, store: Arc<dyn PredictionStore>) -> Self {
        Self {
            classifier: RiskClassifier::new(artifact),
            store,
        }
    }

    fn artifact(&self) -> &ModelArtifact {
        self.classifier.artifact()
    }

    /// Score, persist and describe one observation.
    ///
    /// # Errors
    /// Returns `ScoringError` if the model cannot score the row. Storage
    /// failures are logged and never returned.
    pub async fn predict(
        &self,
        observation: PatientObservation,
    ) -> Result<PredictionResponse, ScoringError> {
        let classification = self
            .classifier
            .classify(&observation, self.artifact().feature_names())?;

        let (prediction_id, created_at) =
            match self.store.insert(&observation, &classification).await {
                Ok(receipt) => (receipt.id, receipt.created_at),
                Err(e) => {
                    tracing::warn!(
                        "Failed to save prediction to {} store: {}",
                        self.store.backend_name(),
                        e
                    );
                    (0, Utc::now())
                }
            };

        tracing::info!(
            "Prediction {} served: prediction={} risk={}",
            prediction_id,
            classification.prediction,
            classification.risk_level
        );

        Ok(PredictionResponse {
            prediction_id,
            patient_name: observation.name,
            prediction: classification.prediction,
            probability_no_disease: classification.probability_no_disease,
            probability_disease: classification.probability_disease,
            risk_level: classification.risk_level,
            model_used: self.artifact().model_name().to_string(),
            prediction_date: format_timestamp(created_at),
        })
    }

    async fn recent_records(&self, limit: usize) -> Vec<PredictionRecord> {
        match self.store.query_recent(limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    "Failed to read predictions from {} store: {}",
                    self.store.backend_name(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Up to `limit` most recent predictions in display form.
    pub async fn list_recent(&self, limit: usize) -> RecentPredictions {
        let predictions: Vec<DisplayPrediction> = self
            .recent_records(limit)
            .await
            .iter()
            .map(DisplayPrediction::from)
            .collect();

        RecentPredictions {
            total_predictions: predictions.len(),
            predictions,
        }
    }

    /// Statistics over up to [`STATS_SCAN_LIMIT`] recent predictions.
    pub async fn compute_stats(&self) -> PredictionStats {
        let records = self.recent_records(STATS_SCAN_LIMIT).await;
        PredictionStats::from_records(&records)
    }

    #[must_use]
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            message: "Heart Disease Prediction API",
            model: self.artifact().model_name().to_string(),
            accuracy: self.artifact().accuracy(),
            features: format!(
                "Predictions are saved to the {} database",
                self.store.backend_name()
            ),
        }
    }

    #[must_use]
    pub fn model_info(&self) -> ModelInfo {
        let artifact = self.artifact();
        ModelInfo {
            model_name: artifact.model_name().to_string(),
            accuracy: artifact.accuracy(),
            features: artifact.feature_names().to_vec(),
            total_features: artifact.feature_names().len(),
            kind: artifact.kind(),
            fingerprint: artifact.fingerprint().to_string(),
        }
    }

    /// Probe the store. The service itself is always reported healthy.
    pub async fn health(&self) -> HealthReport {
        let (database, total_predictions_stored) = match self.store.count().await {
            Ok(count) => (DatabaseState::Connected, count),
            Err(e) => {
                tracing::warn!("Health check could not reach the database: {}", e);
                (DatabaseState::Disconnected, 0)
            }
        };
        HealthReport {
            status: "healthy",
            database,
            total_predictions_stored,
        }
    }
}

impl From<&PredictionRecord> for DisplayPrediction {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            id: record.id,
            patient_name: record.observation.name.clone(),
            age: record.observation.features.age,
            sex: if record.observation.features.sex == 1 {
                "Male"
            } else {
                "Female"
            },
            prediction: if record.prediction == 1 {
                "Disease"
            } else {
                "No Disease"
            },
            disease_probability: round_to(record.disease_probability, 3),
            risk_level: record.risk_level,
            prediction_date: format_timestamp(record.created_at),
        }
    }
}

impl PredictionStats {
    fn from_records(records: &[PredictionRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let total = records.len();
        let disease = records.iter().filter(|r| r.prediction == 1).count();
        let mut distribution = RiskDistribution::default();
        for record in records {
            match record.risk_level {
                RiskLevel::High => distribution.high_risk += 1,
                RiskLevel::Medium => distribution.medium_risk += 1,
                RiskLevel::Low => distribution.low_risk += 1,
            }
        }

        Self {
            total_predictions: total,
            disease_predictions: disease,
            no_disease_predictions: total - disease,
            disease_rate: round_to(disease as f64 / total as f64 * 100.0, 1),
            risk_distribution: distribution,
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
