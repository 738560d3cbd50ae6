//! Model artifact and probability inference.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, Axis};
use risk_core::error::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::FeatureMatrix;

/// Trained binary classifier scoring one feature row
pub trait Classifier: Send + Sync {
    /// Number of input features
    fn n_features(&self) -> usize;

    /// Probability of the positive class (default) for one row
    fn predict_positive(&self, row: ArrayView1<'_, f64>) -> Result<f64>;
}

#[inline]
fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// Logistic regression: `sigmoid(w . x + b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// One weight per feature
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_positive(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        let margin: f64 = self
            .coefficients
            .iter()
            .zip(row.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        Ok(sigmoid(margin))
    }
}

/// Node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split: go left when `x[feature] < threshold`
    Split {
        /// Feature index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
        /// Direction for non-finite values
        #[serde(default)]
        default_left: bool,
    },
    /// Terminal node contributing a margin
    Leaf {
        /// Leaf value (log-odds contribution)
        leaf: f64,
    },
}

/// One regression tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Flattened nodes
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn margin(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        let mut idx = 0;
        // Each step moves to a child; a well-formed tree never revisits a node.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { leaf }) => return Ok(*leaf),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                }) => {
                    let value = row[*feature];
                    let go_left = if value.is_finite() {
                        value < *threshold
                    } else {
                        *default_left
                    };
                    idx = if go_left { *left } else { *right };
                }
                None => {
                    return Err(Error::Prediction(format!("tree node {idx} out of bounds")))
                }
            }
        }
        Err(Error::Prediction("tree traversal did not reach a leaf".to_string()))
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                threshold,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {i} splits on unknown feature {feature}"));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(format!("node {i} has a child out of bounds"));
                }
                if *left <= i || *right <= i {
                    return Err(format!("node {i} points backwards"));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {i} has a non-finite threshold"));
                }
            }
        }
        Ok(())
    }
}

/// Gradient boosted trees for binary classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Number of input features
    pub n_features: usize,
    /// Initial log-odds
    #[serde(default)]
    pub base_score: f64,
    /// Boosted trees
    pub trees: Vec<Tree>,
}

impl Classifier for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_positive(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        let mut margin = self.base_score;
        for tree in &self.trees {
            margin += tree.margin(row)?;
        }
        Ok(sigmoid(margin))
    }
}

/// Serialized classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSpec {
    /// Linear model
    LogisticRegression(LogisticRegression),
    /// Boosted trees
    TreeEnsemble(TreeEnsemble),
}

impl ClassifierSpec {
    fn as_classifier(&self) -> &dyn Classifier {
        match self {
            ClassifierSpec::LogisticRegression(m) => m,
            ClassifierSpec::TreeEnsemble(m) => m,
        }
    }
}

/// Persisted model: classifier plus the column order it was trained on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Model name
    pub name: String,
    /// Model version
    pub version: String,
    /// Training column order
    pub feature_names: Vec<String>,
    /// Classifier parameters
    pub classifier: ClassifierSpec,
}

impl ModelArtifact {
    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(Error::artifact(format!("model {}", self.name), reason));

        if self.feature_names.is_empty() {
            return fail("feature_names is empty".to_string());
        }

        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = self
            .feature_names
            .iter()
            .filter(|n| !seen.insert(n.as_str()))
            .map(String::as_str)
            .collect();
        if !duplicates.is_empty() {
            return fail(format!("duplicate feature names: {}", duplicates.join(", ")));
        }

        let n = self.feature_names.len();
        match &self.classifier {
            ClassifierSpec::LogisticRegression(m) => {
                if m.coefficients.len() != n {
                    return fail(format!(
                        "{} coefficients for {n} features",
                        m.coefficients.len()
                    ));
                }
                if !m.intercept.is_finite() || m.coefficients.iter().any(|c| !c.is_finite()) {
                    return fail("non-finite coefficients".to_string());
                }
            }
            ClassifierSpec::TreeEnsemble(m) => {
                if m.n_features != n {
                    return fail(format!(
                        "ensemble expects {} features, artifact lists {n}",
                        m.n_features
                    ));
                }
                if m.trees.is_empty() {
                    return fail("ensemble has no trees".to_string());
                }
                for (i, tree) in m.trees.iter().enumerate() {
                    if let Err(reason) = tree.validate(n) {
                        return fail(format!("tree {i}: {reason}"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Loaded model answering probability queries
#[derive(Debug, Clone)]
pub struct Predictor {
    artifact: ModelArtifact,
}

impl Predictor {
    /// Wrap a validated model artifact
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    /// Class probabilities, one row per input row: `[p(0), p(1)]`
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Array2<f64>> {
        let classifier = self.artifact.classifier.as_classifier();
        let expected = classifier.n_features();
        if matrix.ncols() != expected {
            return Err(Error::Prediction(format!(
                "model expects {expected} features, got {}",
                matrix.ncols()
            )));
        }

        let mut probabilities = Array2::zeros((matrix.nrows(), 2));
        for (i, row) in matrix.axis_iter(Axis(0)).enumerate() {
            let p = classifier.predict_positive(row)?;
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(Error::Prediction(format!(
                    "row {i}: probability {p} is not in [0, 1]"
                )));
            }
            probabilities[[i, 0]] = 1.0 - p;
            probabilities[[i, 1]] = p;
        }
        Ok(probabilities)
    }

    /// Column order the model was trained on
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    /// Number of input features
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.artifact.feature_names.len()
    }

    /// Model name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.artifact.name
    }

    /// Model version
    #[must_use]
    pub fn version(&self) -> &str {
        &self.artifact.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("F{i}")).collect()
    }

    fn logistic(coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
        ModelArtifact {
            name: "test".into(),
            version: "1".into(),
            feature_names: names(coefficients.len()),
            classifier: ClassifierSpec::LogisticRegression(LogisticRegression {
                coefficients,
                intercept,
            }),
        }
    }

    fn stump() -> ModelArtifact {
        // x0 < 0.5 -> -1.0 ; else x1 < 2.0 -> 0.5 ; else 2.0
        let nodes = vec![
            TreeNode::Split {
                feature: 0,
                threshold: 0.5,
                left: 1,
                right: 2,
                default_left: true,
            },
            TreeNode::Leaf { leaf: -1.0 },
            TreeNode::Split {
                feature: 1,
                threshold: 2.0,
                left: 3,
                right: 4,
                default_left: false,
            },
            TreeNode::Leaf { leaf: 0.5 },
            TreeNode::Leaf { leaf: 2.0 },
        ];
        ModelArtifact {
            name: "gbt".into(),
            version: "1".into(),
            feature_names: names(2),
            classifier: ClassifierSpec::TreeEnsemble(TreeEnsemble {
                n_features: 2,
                base_score: 0.0,
                trees: vec![Tree { nodes }],
            }),
        }
    }

    #[test]
    fn test_logistic_probabilities_sum_to_one() {
        let predictor = Predictor::new(logistic(vec![1.0, -2.0], 0.5)).unwrap();
        let probs = predictor.predict(&array![[0.0, 0.0], [1.0, 1.0]]).unwrap();

        assert_eq!(probs.dim(), (2, 2));
        assert!((probs[[0, 1]] - sigmoid(0.5)).abs() < 1e-12);
        assert!((probs[[1, 1]] - sigmoid(-0.5)).abs() < 1e-12);
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_tree_traversal() {
        let predictor = Predictor::new(stump()).unwrap();
        let probs = predictor
            .predict(&array![[0.0, 0.0], [1.0, 1.0], [1.0, 3.0], [f64::NAN, 9.0]])
            .unwrap();

        assert!((probs[[0, 1]] - sigmoid(-1.0)).abs() < 1e-12);
        assert!((probs[[1, 1]] - sigmoid(0.5)).abs() < 1e-12);
        assert!((probs[[2, 1]] - sigmoid(2.0)).abs() < 1e-12);
        // NaN follows default_left
        assert!((probs[[3, 1]] - sigmoid(-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_column_mismatch() {
        let predictor = Predictor::new(logistic(vec![1.0, 1.0, 1.0], 0.0)).unwrap();
        let err = predictor.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, Error::Prediction(_)));
    }

    #[test]
    fn test_validate_coefficient_count() {
        let mut artifact = logistic(vec![1.0, 1.0], 0.0);
        artifact.feature_names.push("extra".into());
        assert!(Predictor::new(artifact).is_err());
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut artifact = logistic(vec![1.0, 1.0], 0.0);
        artifact.feature_names = vec!["A".into(), "A".into()];
        let err = artifact.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_tree_bounds() {
        let mut artifact = stump();
        if let ClassifierSpec::TreeEnsemble(m) = &mut artifact.classifier {
            m.trees[0].nodes[0] = TreeNode::Split {
                feature: 7,
                threshold: 0.0,
                left: 1,
                right: 2,
                default_left: false,
            };
        }
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_artifact_json() {
        let json = r#"{
            "name": "credit_default_gbt",
            "version": "2024.1",
            "feature_names": ["A", "B"],
            "classifier": {
                "type": "tree_ensemble",
                "n_features": 2,
                "base_score": -0.3,
                "trees": [
                    { "nodes": [
                        { "feature": 1, "threshold": 0.0, "left": 1, "right": 2 },
                        { "leaf": -0.2 },
                        { "leaf": 0.4 }
                    ] }
                ]
            }
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        let predictor = Predictor::new(artifact).unwrap();
        assert_eq!(predictor.n_features(), 2);
        assert_eq!(predictor.version(), "2024.1");

        let probs = predictor.predict(&array![[0.0, 1.0]]).unwrap();
        assert!((probs[[0, 1]] - sigmoid(0.1)).abs() < 1e-12);
    }
}
