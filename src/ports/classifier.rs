//! Classifier port: Trait for scoring a feature row.
//!
//! This trait abstracts the concrete model family (logistic regression,
//! random forest) from the prediction pipeline.

/// Errors that can occur while scoring a feature row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Feature count mismatch: got {got}, expected {expected}")]
    FeatureCount { expected: usize, got: usize },

    #[error("Non-finite feature value at column {0}")]
    NonFiniteInput(usize),

    #[error("Model produced an invalid probability distribution: [{0}, {1}]")]
    InvalidOutput(f64, f64),
}

/// Trait for binary classifiers over {no-disease, disease}.
///
/// Implementations are immutable after load and shared across requests.
pub trait Classifier: Send + Sync {
    /// Number of columns the model expects in a row.
    fn n_features(&self) -> usize;

    /// Class probabilities `[no_disease, disease]` for one row.
    ///
    /// # Errors
    /// Returns `ScoringError::FeatureCount` if the row width is wrong.
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ScoringError>;

    /// Raw class label (0 or 1) for one row, as the model itself would emit it.
    ///
    /// # Errors
    /// Same as [`Classifier::predict_proba`].
    fn predict(&self, row: &[f64]) -> Result<u8, ScoringError> {
        let [p0, p1] = self.predict_proba(row)?;
        Ok(u8::from(p1 > p0))
    }

    /// Human-readable model family name.
    fn kind_name(&self) -> &'static str;
}

/// Check a row's width and values before scoring.
///
/// # Errors
/// Returns an error on a width mismatch or a NaN/infinite value.
pub fn check_row(row: &[f64], expected: usize) -> Result<(), ScoringError> {
    if row.len() != expected {
        return Err(ScoringError::FeatureCount {
            expected,
            got: row.len(),
        });
    }
    if let Some(idx) = row.iter().position(|v| !v.is_finite()) {
        return Err(ScoringError::NonFiniteInput(idx));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_row() {
        assert!(check_row(&[1.0, 2.0], 2).is_ok());
        assert_eq!(
            check_row(&[1.0], 2),
            Err(ScoringError::FeatureCount {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            check_row(&[1.0, f64::NAN], 2),
            Err(ScoringError::NonFiniteInput(1))
        );
    }
}
