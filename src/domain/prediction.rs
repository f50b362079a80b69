//! Prediction result types.
//!
//! Represents the output of the heart disease classifier and the rows
//! persisted for every prediction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::observation::PatientObservation;

/// Disease probability at or above which the label is 1.
///
/// Authoritative over whatever label the raw classifier emits.
pub const DECISION_THRESHOLD: f64 = 0.4;

/// Disease probability at or above which the patient is bucketed High Risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Disease probability at or above which the patient is bucketed Medium Risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// Risk bucket derived from the disease probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    /// Bucket a disease probability. Thresholds are checked highest first.
    #[must_use]
    pub fn from_probability(probability_disease: f64) -> Self {
        if probability_disease >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if probability_disease >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Stored/displayed text.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }

    /// Parse stored text back into a bucket.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Low Risk" => Some(Self::Low),
            "Medium Risk" => Some(Self::Medium),
            "High Risk" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Label emitted by the underlying model, before thresholding
    pub raw_label: u8,

    /// Binary prediction (0 = no disease, 1 = disease present)
    pub prediction: u8,

    pub probability_no_disease: f64,

    pub probability_disease: f64,

    pub risk_level: RiskLevel,
}

impl Classification {
    /// Derive the label and bucket from a `[no_disease, disease]` distribution.
    #[must_use]
    pub fn from_scores(raw_label: u8, probabilities: [f64; 2]) -> Self {
        let [probability_no_disease, probability_disease] = probabilities;
        let prediction = u8::from(probability_disease >= DECISION_THRESHOLD);

        Self {
            raw_label,
            prediction,
            probability_no_disease,
            probability_disease,
            risk_level: RiskLevel::from_probability(probability_disease),
        }
    }
}

/// Identity and timestamp assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertReceipt {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// A persisted prediction. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub observation: PatientObservation,
    pub prediction: u8,
    pub disease_probability: f64,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_boundaries() {
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.70), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(1.0), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_text_roundtrip() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_eq!(RiskLevel::from_label(level.as_str()), Some(level));
        }
        assert_eq!(RiskLevel::from_label("moderate"), None);
        assert_eq!(
            serde_json::to_string(&RiskLevel::Medium).expect("Should serialize"),
            "\"Medium Risk\""
        );
    }

    #[test]
    fn test_threshold_overrides_raw_label() {
        // Raw model says "no disease" but 0.45 clears the 0.4 threshold.
        let c = Classification::from_scores(0, [0.55, 0.45]);
        assert_eq!(c.raw_label, 0);
        assert_eq!(c.prediction, 1);
        assert_eq!(c.risk_level, RiskLevel::Medium);

        let c = Classification::from_scores(1, [0.65, 0.35]);
        assert_eq!(c.prediction, 0);
        assert_eq!(c.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let c = Classification::from_scores(0, [0.6, 0.4]);
        assert_eq!(c.prediction, 1);
    }
}
