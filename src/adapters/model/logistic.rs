//! Logistic regression scorer.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::ports::{check_row, Classifier, ScoringError};

/// Logistic regression exported as plain coefficients.
///
/// When `scaler_mean`/`scaler_scale` are present, each feature is
/// standardized as `(x - mean) / scale` before the linear term, matching a
/// scaler + regression pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scaler_scale: Option<Vec<f64>>,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl LogisticRegressionModel {
    pub(super) fn validate(&self) -> Result<(), ArtifactError> {
        let n = self.coefficients.len();
        if n == 0 {
            return Err(ArtifactError::InvalidModel(
                "logistic regression has no coefficients".into(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::InvalidModel(
                "logistic regression parameters must be finite".into(),
            ));
        }
        if let Some(mean) = &self.scaler_mean {
            if mean.len() != n || mean.iter().any(|m| !m.is_finite()) {
                return Err(ArtifactError::InvalidModel(format!(
                    "scaler_mean must hold {n} finite values"
                )));
            }
        }
        if let Some(scale) = &self.scaler_scale {
            if scale.len() != n || scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                return Err(ArtifactError::InvalidModel(format!(
                    "scaler_scale must hold {n} finite non-zero values"
                )));
            }
        }
        Ok(())
    }

    /// Linear term `intercept + Σ coef_i * x_i'` on the (optionally standardized) row.
    fn decision_function(&self, row: &[f64]) -> f64 {
        let mut z = self.intercept;
        for (i, (&x, &coef)) in row.iter().zip(&self.coefficients).enumerate() {
            let mean = self.scaler_mean.as_ref().map_or(0.0, |m| m[i]);
            let scale = self.scaler_scale.as_ref().map_or(1.0, |s| s[i]);
            z += coef * (x - mean) / scale;
        }
        z
    }
}

impl Classifier for LogisticRegressionModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ScoringError> {
        check_row(row, self.n_features())?;
        let p1 = sigmoid(self.decision_function(row));
        if !p1.is_finite() {
            return Err(ScoringError::InvalidOutput(1.0 - p1, p1));
        }
        Ok([1.0 - p1, p1])
    }

    fn kind_name(&self) -> &'static str {
        "Logistic Regression"
    }
}
