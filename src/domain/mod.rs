//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. Everything here is serializable and free of
//! database or model-format concerns.

mod observation;
mod prediction;

pub use observation::{
    default_feature_order, ClinicalFeatures, FeatureRow, PatientObservation,
    DEFAULT_PATIENT_NAME, FEATURE_NAMES,
};
pub use prediction::{
    Classification, InsertReceipt, PredictionRecord, RiskLevel, DECISION_THRESHOLD,
    HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD,
};
