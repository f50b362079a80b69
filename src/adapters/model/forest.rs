//! Random forest scorer over flattened decision trees.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::ports::{check_row, Classifier, ScoringError};

/// Child index marking a leaf.
const LEAF: i64 = -1;

/// One decision tree in flattened array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`. Otherwise a sample goes
/// left when `row[feature[i]] <= threshold[i]`. `value[i]` holds the training
/// class counts `[no_disease, disease]` that reached node `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    /// Check structure so traversal always terminates on a usable leaf.
    ///
    /// Children must point strictly forward, which rules out cycles.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree arrays have different lengths".into());
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {i} has only a right child"));
                }
                let [a, b] = self.value[i];
                if !(a.is_finite() && b.is_finite() && a >= 0.0 && b >= 0.0 && a + b > 0.0) {
                    return Err(format!("leaf {i} has no usable class counts"));
                }
                continue;
            }

            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i} points to invalid child {child}"));
                }
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {i} splits on unknown feature {f}"));
            }
            if self.threshold[i].is_nan() {
                return Err(format!("node {i} has a NaN threshold"));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf `row` lands in.
    fn leaf_distribution(&self, row: &[f64]) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let f = self.feature[node] as usize;
            node = if row[f] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let [a, b] = self.value[node];
        let total = a + b;
        [a / total, b / total]
    }
}

/// Bagged ensemble of decision trees; probability is the mean leaf distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestModel {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForestModel {
    pub(super) fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features == 0 {
            return Err(ArtifactError::InvalidModel(
                "random forest must declare n_features".into(),
            ));
        }
        if self.trees.is_empty() {
            return Err(ArtifactError::InvalidModel("random forest has no trees".into()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| ArtifactError::InvalidModel(format!("tree {idx}: {e}")))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ScoringError> {
        check_row(row, self.n_features)?;

        let mut sum = [0.0_f64; 2];
        for tree in &self.trees {
            let [a, b] = tree.leaf_distribution(row);
            sum[0] += a;
            sum[1] += b;
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }

    fn kind_name(&self) -> &'static str {
        "Random Forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single split on `feature`: left leaf counts `left`, right leaf counts `right`.
    fn stump(feature: i64, threshold: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![[10.0, 10.0], left, right],
        }
    }

    fn forest() -> RandomForestModel {
        RandomForestModel {
            n_features: 2,
            trees: vec![
                stump(0, 50.0, [8.0, 2.0], [2.0, 8.0]),
                stump(1, 0.5, [5.0, 5.0], [0.0, 4.0]),
            ],
        }
    }

    #[test]
    fn test_forest_averages_leaves() {
        let f = forest();
        assert!(f.validate().is_ok());

        // Tree 0 -> right (0.8 disease); tree 1 -> left (0.5 disease).
        let [p0, p1] = f.predict_proba(&[60.0, 0.0]).expect("Should score");
        assert!((p1 - 0.65).abs() < 1e-12);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);

        // Threshold comparison is inclusive on the left branch.
        let [_, p1] = f.predict_proba(&[50.0, 1.0]).expect("Should score");
        assert!((p1 - (0.2 + 1.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_forest_raw_label_is_argmax() {
        let f = forest();
        assert_eq!(f.predict(&[60.0, 0.0]).expect("Should label"), 1);
        assert_eq!(f.predict(&[10.0, 0.0]).expect("Should label"), 0);
    }

    #[test]
    fn test_forest_rejects_wrong_width() {
        assert!(forest().predict_proba(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_validation_rejects_backward_child() {
        let mut tree = stump(0, 1.0, [1.0, 0.0], [0.0, 1.0]);
        tree.children_left[0] = 0;
        assert!(tree.validate(2).is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_feature() {
        let tree = stump(5, 1.0, [1.0, 0.0], [0.0, 1.0]);
        assert!(tree.validate(2).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_leaf() {
        let tree = stump(0, 1.0, [0.0, 0.0], [0.0, 1.0]);
        assert!(tree.validate(2).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_forest() {
        let f = RandomForestModel {
            n_features: 2,
            trees: vec![],
        };
        assert!(f.validate().is_err());
    }
}
