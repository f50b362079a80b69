//! Patient observation types for heart disease risk prediction.
//!
//! Based on the thirteen clinical features of the Cleveland heart disease dataset.

use serde::{Deserialize, Serialize};

/// Name recorded when the request does not carry one.
pub const DEFAULT_PATIENT_NAME: &str = "Unknown Patient";

/// Default feature ordering, used when the model artifact does not ship its own.
pub const FEATURE_NAMES: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

fn default_patient_name() -> String {
    DEFAULT_PATIENT_NAME.to_string()
}

/// One patient's submission to `/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientObservation {
    /// Free-text patient name (stored, never scored)
    #[serde(default = "default_patient_name")]
    pub name: String,

    /// Clinical features for prediction
    #[serde(flatten)]
    pub features: ClinicalFeatures,
}

/// Clinical features for heart disease prediction.
///
/// All thirteen are required. Values are not range-checked: whatever arrives
/// is handed to the model as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFeatures {
    /// Age in years
    pub age: i32,

    /// Sex: 0 = female, 1 = male
    pub sex: i32,

    /// Chest pain type (0-3)
    pub cp: i32,

    /// Resting blood pressure in mmHg
    pub trestbps: i32,

    /// Serum cholesterol in mg/dL
    pub chol: i32,

    /// Fasting blood sugar > 120 mg/dL: 0 = no, 1 = yes
    pub fbs: i32,

    /// Resting ECG result (0-2)
    pub restecg: i32,

    /// Maximum heart rate achieved
    pub thalach: i32,

    /// Exercise induced angina: 0 = no, 1 = yes
    pub exang: i32,

    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment (0-2)
    pub slope: i32,

    /// Number of major vessels colored by fluoroscopy (0-3)
    pub ca: i32,

    /// Thalassemia code (1-3)
    pub thal: i32,
}

/// A feature row ready for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub values: Vec<f64>,
    /// True when the artifact's ordering could not be applied and the
    /// declared field order was used instead.
    pub fallback: bool,
}

impl ClinicalFeatures {
    /// Convert features to a vector in declared field order (see [`FEATURE_NAMES`]).
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.age),
            f64::from(self.sex),
            f64::from(self.cp),
            f64::from(self.trestbps),
            f64::from(self.chol),
            f64::from(self.fbs),
            f64::from(self.restecg),
            f64::from(self.thalach),
            f64::from(self.exang),
            self.oldpeak,
            f64::from(self.slope),
            f64::from(self.ca),
            f64::from(self.thal),
        ]
    }

    /// Look up a single feature by its column name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "age" => f64::from(self.age),
            "sex" => f64::from(self.sex),
            "cp" => f64::from(self.cp),
            "trestbps" => f64::from(self.trestbps),
            "chol" => f64::from(self.chol),
            "fbs" => f64::from(self.fbs),
            "restecg" => f64::from(self.restecg),
            "thalach" => f64::from(self.thalach),
            "exang" => f64::from(self.exang),
            "oldpeak" => self.oldpeak,
            "slope" => f64::from(self.slope),
            "ca" => f64::from(self.ca),
            "thal" => f64::from(self.thal),
            _ => return None,
        };
        Some(value)
    }

    /// Project features into the given column order.
    ///
    /// Returns `None` if the order is empty or names a column these features
    /// do not have.
    #[must_use]
    pub fn project(&self, order: &[String]) -> Option<Vec<f64>> {
        if order.is_empty() {
            return None;
        }
        order.iter().map(|name| self.get(name)).collect()
    }

    /// Build the scoring row for `order`, degrading to declared field order on
    /// a shape mismatch.
    #[must_use]
    pub fn feature_row(&self, order: &[String]) -> FeatureRow {
        match self.project(order) {
            Some(values) => FeatureRow {
                values,
                fallback: false,
            },
            None => FeatureRow {
                values: self.to_vec(),
                fallback: true,
            },
        }
    }
}

impl PatientObservation {
    /// Create an observation with the default patient name.
    #[must_use]
    pub fn new(features: ClinicalFeatures) -> Self {
        Self {
            name: default_patient_name(),
            features,
        }
    }

    /// Create an observation for a named patient.
    #[must_use]
    pub fn with_name(name: impl Into<String>, features: ClinicalFeatures) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }
}

/// The default ordering as owned strings.
#[must_use]
pub fn default_feature_order() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClinicalFeatures {
        ClinicalFeatures {
            age: 55,
            sex: 1,
            cp: 0,
            trestbps: 130,
            chol: 250,
            fbs: 0,
            restecg: 1,
            thalach: 150,
            exang: 0,
            oldpeak: 1.0,
            slope: 2,
            ca: 0,
            thal: 2,
        }
    }

    #[test]
    fn test_features_to_vec() {
        let vec = sample().to_vec();
        assert_eq!(vec.len(), FEATURE_NAMES.len());
        assert!((vec[0] - 55.0).abs() < f64::EPSILON);
        assert!((vec[9] - 1.0).abs() < f64::EPSILON);
        assert!((vec[12] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_get_matches_declared_order() {
        let features = sample();
        let by_name: Vec<f64> = FEATURE_NAMES
            .iter()
            .map(|n| features.get(n).expect("Known feature"))
            .collect();
        assert_eq!(by_name, features.to_vec());
        assert!(features.get("bmi").is_none());
    }

    #[test]
    fn test_project_reorders() {
        let order = vec!["thalach".to_string(), "age".to_string()];
        let row = sample().project(&order).expect("Should project");
        assert_eq!(row, vec![150.0, 55.0]);
    }

    #[test]
    fn test_feature_row_falls_back_on_unknown_column() {
        let order = vec!["age".to_string(), "bmi".to_string()];
        let row = sample().feature_row(&order);
        assert!(row.fallback);
        assert_eq!(row.values, sample().to_vec());

        let row = sample().feature_row(&[]);
        assert!(row.fallback);

        let row = sample().feature_row(&default_feature_order());
        assert!(!row.fallback);
    }

    #[test]
    fn test_deserialize_defaults_name() {
        let json = r#"{"age":55,"sex":1,"cp":0,"trestbps":130,"chol":250,"fbs":0,
            "restecg":1,"thalach":150,"exang":0,"oldpeak":1.0,"slope":2,"ca":0,"thal":2}"#;
        let obs: PatientObservation = serde_json::from_str(json).expect("Should parse");
        assert_eq!(obs.name, DEFAULT_PATIENT_NAME);
        assert_eq!(obs.features, sample());
    }

    #[test]
    fn test_deserialize_rejects_missing_field() {
        let json = r#"{"name":"Ann","age":55,"sex":1}"#;
        assert!(serde_json::from_str::<PatientObservation>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_wrong_kind() {
        let json = r#"{"age":"old","sex":1,"cp":0,"trestbps":130,"chol":250,"fbs":0,
            "restecg":1,"thalach":150,"exang":0,"oldpeak":1.0,"slope":2,"ca":0,"thal":2}"#;
        assert!(serde_json::from_str::<PatientObservation>(json).is_err());
    }

    #[test]
    fn test_out_of_range_values_are_accepted() {
        let mut features = sample();
        features.age = -4;
        features.chol = 9000;
        let obs = PatientObservation::with_name("Edge", features);
        assert_eq!(obs.features.get("chol"), Some(9000.0));
    }
}
