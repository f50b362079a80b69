//! Risk classifier: turns an observation into a thresholded classification.

use std::sync::Arc;

use crate::adapters::ModelArtifact;
use crate::domain::{Classification, PatientObservation};
use crate::ports::{Classifier, ScoringError};

/// Tolerance for a distribution that should sum to one.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Wraps the loaded artifact and applies the decision threshold and risk
/// buckets on top of the raw model output.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    artifact: Arc<ModelArtifact>,
}

impl RiskClassifier {
    #[must_use]
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        Self { artifact }
    }

    #[must_use]
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Score one observation with columns ordered per `feature_order`.
    ///
    /// An order that names unknown columns degrades to the declared field
    /// order with a warning.
    ///
    /// # Errors
    /// Returns `ScoringError` if the row does not fit the model or the model
    /// output is not a probability distribution.
    pub fn classify(
        &self,
        observation: &PatientObservation,
        feature_order: &[String],
    ) -> Result<Classification, ScoringError> {
        let row = observation.features.feature_row(feature_order);
        if row.fallback {
            tracing::warn!(
                "Feature order {:?} does not match observation fields, using declared order",
                feature_order
            );
        }

        let model = self.artifact.classifier();
        let raw_label = model.predict(&row.values)?;
        let [p0, p1] = model.predict_proba(&row.values)?;

        let valid = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
        if !valid(p0) || !valid(p1) || (p0 + p1 - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ScoringError::InvalidOutput(p0, p1));
        }

        let classification = Classification::from_scores(raw_label, [p0, p1]);
        tracing::debug!(
            "Scored row: raw_label={} prediction={} p_disease={:.4} risk={}",
            raw_label,
            classification.prediction,
            p1,
            classification.risk_level
        );
        Ok(classification)
    }

    /// Score with the artifact's own feature order.
    ///
    /// # Errors
    /// Same as [`RiskClassifier::classify`].
    pub fn classify_default(
        &self,
        observation: &PatientObservation,
    ) -> Result<Classification, ScoringError> {
        self.classify(observation, self.artifact.feature_names())
    }
}
